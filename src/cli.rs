use serde_json::Value;
use sqlx::SqlitePool;
use std::fs;

use crate::backup::{latest_backup, run_backup};

pub enum Command {
    Serve,
    Backup,
    Export { path: String },
}

const USAGE: &str = "usage: arsenal [serve | backup | export <file>]";

pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    match args.next().as_deref() {
        None | Some("serve") => Ok(Command::Serve),
        Some("backup") => Ok(Command::Backup),
        Some("export") => match args.next() {
            Some(path) => Ok(Command::Export { path }),
            None => Err(USAGE.to_string()),
        },
        Some(other) => Err(format!("unknown command '{other}'\n{USAGE}")),
    }
}

/// Run the backup job once, the same way the scheduled endpoint does.
pub async fn backup(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_backup(pool).await?;

    println!("Created backup {}", report.backup_id);
    for (name, result) in [
        ("tools", &report.results.tools),
        ("prompts", &report.results.prompts),
        ("media", &report.results.media),
        ("notes", &report.results.notes),
    ] {
        match &result.error {
            None => println!("  {name}: {} rows", result.count),
            Some(e) => println!("  {name}: FAILED ({e})"),
        }
    }

    if !report.success {
        return Err("one or more tables failed to back up".into());
    }
    Ok(())
}

/// Write the newest backup's snapshot to `path` as pretty-printed JSON.
pub async fn export(pool: &SqlitePool, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(backup) = latest_backup(pool).await? else {
        return Err("no backups found; run `arsenal backup` first".into());
    };

    let data: Value = serde_json::from_str(&backup.data)?;
    let document = serde_json::json!({
        "backup_id": backup.id,
        "created_at": backup.created_at,
        "data": data,
    });
    fs::write(path, serde_json::to_string_pretty(&document)?)?;

    println!("Exported backup {} to {}", backup.id, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_serve() {
        assert!(matches!(parse_args(args(&[])), Ok(Command::Serve)));
        assert!(matches!(parse_args(args(&["serve"])), Ok(Command::Serve)));
    }

    #[test]
    fn export_needs_a_path() {
        assert!(parse_args(args(&["export"])).is_err());
        match parse_args(args(&["export", "out.json"])) {
            Ok(Command::Export { path }) => assert_eq!(path, "out.json"),
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = parse_args(args(&["import"])).err().unwrap();
        assert!(err.contains("unknown command 'import'"));
    }
}
