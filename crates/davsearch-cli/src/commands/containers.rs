//! The `containers` command.

use std::fmt::Write;
use std::path::Path;

use davsearch_core::{CalendarContainer, Principal};
use davsearch_providers::ProviderError;

use crate::commands::open_engine;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Renders containers one per line, in display order.
pub fn render(containers: &[CalendarContainer]) -> String {
    if containers.is_empty() {
        return "no containers".to_string();
    }
    let mut out = String::new();
    for container in containers {
        let _ = write!(
            out,
            "{:<12} {:<20} order {:>3}",
            container.kind.as_str(),
            container.uri,
            container.order
        );
        if container.read_only {
            out.push_str("  read-only");
        }
        if let Some(name) = &container.display_name {
            let _ = write!(out, "  {name:?}");
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

/// List the calendars and subscriptions of a user.
pub async fn run(config: &AppConfig, root: &Path, user: &str, json: bool) -> CliResult<()> {
    let principal = Principal::for_user(user)
        .map_err(|_| CliError::Search(ProviderError::InvalidUser(user.to_string())))?;
    let engine = open_engine(root, config.engine_config()?).await?;
    let containers = engine.containers(&principal).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&containers)?);
    } else {
        println!("{}", render(&containers));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn lists_in_display_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for path in [
            "alice/calendars/work",
            "alice/calendars/personal",
            "alice/subscriptions/holidays",
        ] {
            fs::create_dir_all(root.join(path)).unwrap();
        }
        fs::write(
            root.join("alice/calendars/work/container.toml"),
            "display_name = \"Work\"\norder = 2\n",
        )
        .unwrap();

        let engine = open_engine(root, Default::default()).await.unwrap();
        let principal = Principal::for_user("alice").unwrap();
        let containers = engine.containers(&principal).await.unwrap();

        insta::assert_snapshot!(render(&containers), @r#"
        calendar     personal             order   0
        subscription holidays             order   0  read-only
        calendar     work                 order   2  "Work"
        "#);
    }

    #[test]
    fn empty_listing() {
        assert_eq!(render(&[]), "no containers");
    }
}
