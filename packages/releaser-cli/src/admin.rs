use releaser_core::{ReleaseError, ReleaseRecord, ReleaseService, ADMIN_PLATFORMS};
use releaser_utils::format_local;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Release(#[from] ReleaseError),
}

/// What the menu loop does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive release administration menu.
///
/// Reads answers line by line from `input` and writes prompts to `output`, so
/// it runs the same against a terminal or in-memory buffers.
pub struct AdminConsole<'a, R, W> {
    service: &'a ReleaseService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> AdminConsole<'a, R, W> {
    pub fn new(service: &'a ReleaseService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu until the operator exits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "\n=== {} Update Server Admin ===",
            self.service.product_name()
        )?;

        loop {
            writeln!(self.output, "\nOptions:")?;
            writeln!(self.output, "1. Create new release")?;
            writeln!(self.output, "2. List all releases")?;
            writeln!(self.output, "3. Set latest release")?;
            writeln!(self.output, "4. Delete a release")?;
            writeln!(self.output, "5. Exit")?;

            let Some(choice) = self.prompt("\nSelect an option: ")? else {
                return Ok(());
            };
            let result = match choice.as_str() {
                "1" => self.create_release().await,
                "2" => self.list_releases().await,
                "3" => self.set_latest_release().await,
                "4" => self.delete_release().await,
                "5" => {
                    writeln!(self.output, "\nExiting...")?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.output, "Invalid option. Please try again.")?;
                    Ok(Flow::Continue)
                }
            };

            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(ActionError::Io(e)) => return Err(e),
                Err(ActionError::Release(e)) => {
                    tracing::debug!(error = %e, "admin action failed");
                    writeln!(self.output, "Error: {}", e)?;
                }
            }
        }
    }

    /// Ask `question` and return the trimmed answer, or `None` at end of input.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn create_release(&mut self) -> Result<Flow, ActionError> {
        writeln!(self.output, "\n=== Create New Release ===\n")?;

        let Some(version) = self.prompt("Enter version number (e.g., 1.0.3): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(notes) = self.prompt("Enter release notes (use \\n for line breaks): ")? else {
            return Ok(Flow::Exit);
        };

        let mut urls = Vec::with_capacity(ADMIN_PLATFORMS.len());
        for platform in ADMIN_PLATFORMS {
            let default_url = self.service.default_download_url(&version, platform);
            let question = format!(
                "Enter {} download URL (default: {}): ",
                platform_label(platform),
                default_url
            );
            let Some(answer) = self.prompt(&question)? else {
                return Ok(Flow::Exit);
            };
            let url = if answer.is_empty() { default_url } else { answer };
            urls.push((platform.to_string(), url));
        }

        let Some(mandatory) = self.prompt("Is this update mandatory? (y/n): ")? else {
            return Ok(Flow::Exit);
        };
        let mandatory = mandatory.eq_ignore_ascii_case("y");

        let version = self.service.create(&version, &notes, urls, mandatory).await?;
        writeln!(self.output, "\nRelease v{} created successfully!", version)?;
        writeln!(self.output, "It is now the latest release.")?;
        Ok(Flow::Continue)
    }

    async fn list_releases(&mut self) -> Result<Flow, ActionError> {
        writeln!(self.output, "\n=== Available Releases ===\n")?;

        let releases = self.service.list().await?;
        if releases.is_empty() {
            writeln!(self.output, "No releases found.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "Version\t\tDate\t\t\tMandatory")?;
        writeln!(self.output, "-------\t\t----\t\t\t---------")?;
        for (_, record) in &releases {
            writeln!(self.output, "{}", table_row(record))?;
        }
        Ok(Flow::Continue)
    }

    async fn set_latest_release(&mut self) -> Result<Flow, ActionError> {
        writeln!(self.output, "\n=== Set Latest Release ===\n")?;

        let selected = match self
            .select_version("\nSelect version number to set as latest: ")
            .await?
        {
            Selection::Chosen(version) => version,
            Selection::Nothing => return Ok(Flow::Continue),
            Selection::EndOfInput => return Ok(Flow::Exit),
        };

        self.service.promote(&selected).await?;
        writeln!(
            self.output,
            "\nv{} has been set as the latest release.",
            selected
        )?;
        Ok(Flow::Continue)
    }

    async fn delete_release(&mut self) -> Result<Flow, ActionError> {
        writeln!(self.output, "\n=== Delete Release ===\n")?;

        let selected = match self
            .select_version("\nSelect version number to delete: ")
            .await?
        {
            Selection::Chosen(version) => version,
            Selection::Nothing => return Ok(Flow::Continue),
            Selection::EndOfInput => return Ok(Flow::Exit),
        };

        let outcome = self.service.delete(&selected).await?;
        if outcome.latest_is_stale {
            writeln!(
                self.output,
                "\nWarning: You deleted the latest release. Please set a new latest release."
            )?;
        }
        writeln!(self.output, "\nv{} has been deleted.", outcome.version)?;
        Ok(Flow::Continue)
    }

    /// Print the numbered version list and read a 1-based choice.
    async fn select_version(&mut self, question: &str) -> Result<Selection, ActionError> {
        let versions: Vec<String> = self
            .service
            .list()
            .await?
            .into_iter()
            .map(|(version, _)| version)
            .collect();
        if versions.is_empty() {
            writeln!(self.output, "No releases found.")?;
            return Ok(Selection::Nothing);
        }

        writeln!(self.output, "Available versions:")?;
        for (index, version) in versions.iter().enumerate() {
            writeln!(self.output, "{}. v{}", index + 1, version)?;
        }

        let Some(choice) = self.prompt(question)? else {
            return Ok(Selection::EndOfInput);
        };
        match choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| versions.get(index))
        {
            Some(version) => Ok(Selection::Chosen(version.clone())),
            None => {
                writeln!(self.output, "Invalid selection.")?;
                Ok(Selection::Nothing)
            }
        }
    }
}

enum Selection {
    Chosen(String),
    Nothing,
    EndOfInput,
}

fn platform_label(platform: &str) -> &str {
    match platform {
        "win" => "Windows",
        "mac" => "macOS",
        "linux" => "Linux",
        other => other,
    }
}

fn table_row(record: &ReleaseRecord) -> String {
    format!(
        "{}\t{}\t{}",
        record.tag,
        format_local(&record.published_at),
        if record.mandatory { "Yes" } else { "No" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use releaser_core::{MemoryStore, PublishRequest};
    use std::io::Cursor;
    use std::sync::Arc;

    fn service() -> ReleaseService {
        ReleaseService::new(Arc::new(MemoryStore::new()))
    }

    async fn run_session(service: &ReleaseService, script: &str) -> String {
        let input = Cursor::new(script.to_string());
        let mut console = AdminConsole::new(service, input, Vec::new());
        console.run().await.unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_create_with_default_urls() {
        let service = service();
        let script = "1\n1.0.3\nFirst build\n\nhttps://mirror/mac.dmg\n\ny\n5\n";
        let output = run_session(&service, script).await;

        assert!(output.contains("Release v1.0.3 created successfully!"));
        let record = service.version("1.0.3").await.unwrap();
        assert!(record.mandatory);
        assert_eq!(record.notes, "First build");
        assert_eq!(
            record.assets[0].url,
            "http://localhost:3005/downloads/NepalBooks-1.0.3-win.exe"
        );
        assert_eq!(record.assets[1].url, "https://mirror/mac.dmg");
        assert_eq!(record.assets[2].filename, "NepalBooks-1.0.3-linux.AppImage");
        assert_eq!(service.latest().await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let service = service();
        for version in ["1.0.3", "1.0.10", "2.0.0"] {
            service.publish(PublishRequest::new(version)).await.unwrap();
        }
        let output = run_session(&service, "2\n5\n").await;

        let first = output.find("v2.0.0\t").unwrap();
        let second = output.find("v1.0.10\t").unwrap();
        let third = output.find("v1.0.3\t").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let service = service();
        let output = run_session(&service, "2\n3\n4\n5\n").await;
        assert_eq!(output.matches("No releases found.").count(), 3);
    }

    #[tokio::test]
    async fn test_set_latest_by_index() {
        let service = service();
        service.publish(PublishRequest::new("1.0.0")).await.unwrap();
        service.publish(PublishRequest::new("1.1.0")).await.unwrap();

        // Index 2 is 1.0.0 in newest-first order.
        let output = run_session(&service, "3\n2\n5\n").await;
        assert!(output.contains("1. v1.1.0\n2. v1.0.0\n"));
        assert!(output.contains("v1.0.0 has been set as the latest release."));
        assert_eq!(service.latest().await.unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn test_delete_latest_warns() {
        let service = service();
        service.publish(PublishRequest::new("1.0.0")).await.unwrap();
        service.publish(PublishRequest::new("1.1.0")).await.unwrap();

        let output = run_session(&service, "4\n2\n4\n1\n5\n").await;
        assert_eq!(
            output
                .matches("Warning: You deleted the latest release.")
                .count(),
            1
        );
        assert!(output.contains("v1.0.0 has been deleted."));
        assert!(output.contains("v1.1.0 has been deleted."));
        assert_eq!(service.latest().await.unwrap().version, "1.1.0");
    }

    #[tokio::test]
    async fn test_invalid_inputs_keep_looping() {
        let service = service();
        service.publish(PublishRequest::new("1.0.0")).await.unwrap();

        let output = run_session(&service, "9\n3\nabc\n4\n0\n5\n").await;
        assert!(output.contains("Invalid option. Please try again."));
        assert_eq!(output.matches("Invalid selection.").count(), 2);
        assert!(output.contains("Exiting..."));
        assert!(service.version("1.0.0").await.is_ok());
    }

    #[tokio::test]
    async fn test_action_error_is_reported() {
        let service = service();
        let output = run_session(&service, "1\n\n\n\n\n\nn\n2\n5\n").await;
        assert!(output.contains("Error: Version and downloadUrls are required"));
        assert!(output.contains("No releases found."));
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let service = service();
        let output = run_session(&service, "1\n2.0.0\n").await;
        assert!(!output.contains("created successfully"));
        assert!(service.version("2.0.0").await.is_err());
    }
}
