use std::path::Path;

use os_tips::config::AppConfig;
use os_tips::core::Medal;
use os_tips::storage::SnapshotFormat;
use os_tips::{athletes_cmd, backup_cmd, result_cmd, scoreboard_cmd, tip_cmd};
use tempfile::tempdir;

const ATHLETES: &str = "athlete_id,name,sport\n\
    fk,Frida Karlsson,Cross-country\n\
    ea,Ebba Andersson,Cross-country\n\
    sh,Sara Hector,Alpine\n";

fn setup(root: &Path) -> AppConfig {
    let athletes = root.join("athletes.csv");
    std::fs::write(&athletes, ATHLETES).unwrap();
    AppConfig {
        state_dir: root.join("state"),
        athletes_csv: athletes,
        players: vec!["Johan".into(), "Tony".into()],
        lock_timeout: None,
    }
}

fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
    let mut buf = Vec::new();
    f(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn athletes_lists_sports_and_members() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());

    let sports = output(|out| athletes_cmd::run(&cfg, None, out).unwrap());
    assert!(sports.contains("Alpine"));
    assert!(sports.contains("Cross-country  2"));

    let members = output(|out| athletes_cmd::run(&cfg, Some("Cross-country".into()), out).unwrap());
    let ebba = members.find("Ebba").unwrap();
    let frida = members.find("Frida").unwrap();
    assert!(ebba < frida);

    let mut sink = Vec::new();
    assert!(athletes_cmd::run(&cfg, Some("Curling".into()), &mut sink).is_err());
}

#[test]
fn tip_set_update_remove() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());

    let msg = output(|out| {
        tip_cmd::set(&cfg, "Johan".into(), "fk".into(), Medal::Silver, None, out).unwrap()
    });
    assert!(msg.starts_with("Saved fk@Johan: Silver"));

    let msg = output(|out| {
        tip_cmd::set(&cfg, "Johan".into(), "fk".into(), Medal::Gold, Some("sprint".into()), out)
            .unwrap()
    });
    assert!(msg.contains("Silver -> Gold"));

    let listing = output(|out| tip_cmd::list(&cfg, "Johan".into(), None, out).unwrap());
    assert!(listing.contains("Frida Karlsson"));
    assert!(listing.contains("sprint"));

    let msg = output(|out| tip_cmd::remove(&cfg, "Johan".into(), "fk".into(), out).unwrap());
    assert!(msg.starts_with("Removed"));
    let listing = output(|out| tip_cmd::list(&cfg, "Johan".into(), None, out).unwrap());
    assert!(listing.contains("No tips saved yet"));
}

#[test]
fn tip_set_validates_player_and_athlete() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let mut sink = Vec::new();

    let err = tip_cmd::set(&cfg, "Nobody".into(), "fk".into(), Medal::Gold, None, &mut sink)
        .unwrap_err();
    assert!(err.to_string().contains("unknown player"));

    let err = tip_cmd::set(&cfg, "Tony".into(), "xx".into(), Medal::Gold, None, &mut sink)
        .unwrap_err();
    assert!(err.to_string().contains("unknown athlete"));
}

#[test]
fn scoreboard_ranks_players() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let mut sink = Vec::new();

    tip_cmd::set(&cfg, "Tony".into(), "sh".into(), Medal::Gold, None, &mut sink).unwrap();
    tip_cmd::set(&cfg, "Johan".into(), "sh".into(), Medal::Bronze, None, &mut sink).unwrap();
    result_cmd::set(&cfg, "sh".into(), Medal::Gold, &mut sink).unwrap();

    let results = output(|out| result_cmd::list(&cfg, out).unwrap());
    assert!(results.contains("Sara Hector"));
    assert!(results.contains("Gold"));

    let json_path = dir.path().join("board.json");
    let board = output(|out| scoreboard_cmd::run(&cfg, Some(json_path.clone()), out).unwrap());
    let lines: Vec<&str> = board.lines().collect();
    assert!(lines[1].contains("Tony") && lines[1].contains("5"));
    assert!(lines[2].contains("Johan") && lines[2].contains("2"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(json["rows"][0]["player"], "Tony");
    assert_eq!(json["rows"][0]["points"], 5);
}

#[test]
fn backup_and_restore_through_files() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let mut sink = Vec::new();

    tip_cmd::set(&cfg, "Tony".into(), "ea".into(), Medal::Bronze, None, &mut sink).unwrap();
    result_cmd::set(&cfg, "ea".into(), Medal::Silver, &mut sink).unwrap();

    let tips_backup = dir.path().join("backup").join("tips.csv");
    let results_backup = dir.path().join("backup").join("results.csv");
    backup_cmd::export(&cfg, tips_backup.clone(), None, false).unwrap();
    backup_cmd::export(&cfg, results_backup.clone(), None, true).unwrap();
    assert!(std::fs::read_to_string(&tips_backup).unwrap().starts_with("schema_version,"));

    // Simulate a redeploy that wiped the state directory
    std::fs::remove_dir_all(&cfg.state_dir).unwrap();
    let empty = output(|out| tip_cmd::list(&cfg, "Tony".into(), None, out).unwrap());
    assert!(empty.contains("No tips saved yet"));

    backup_cmd::import(&cfg, tips_backup, Some(SnapshotFormat::Csv), false).unwrap();
    backup_cmd::import(&cfg, results_backup, None, true).unwrap();

    let store = cfg.open_store().unwrap();
    assert_eq!(store.load().unwrap().len(), 1);
    assert_eq!(store.stored_results().unwrap()[0].medal, Medal::Silver);
}

#[test]
fn reset_requires_confirmation() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let mut sink = Vec::new();
    tip_cmd::set(&cfg, "Tony".into(), "ea".into(), Medal::Gold, None, &mut sink).unwrap();

    assert!(backup_cmd::reset(&cfg, false, &mut sink).is_err());
    assert_eq!(cfg.open_store().unwrap().load().unwrap().len(), 1);

    let msg = output(|out| backup_cmd::reset(&cfg, true, out).unwrap());
    assert_eq!(msg.trim(), "Removed 1 tip(s)");
    assert!(cfg.open_store().unwrap().load().unwrap().is_empty());
}
