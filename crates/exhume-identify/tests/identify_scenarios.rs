//! End-to-end identification scenarios over scratch data directories,
//! with the inspector and chooser replaced by scripted fakes.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use exhume_common::{Chooser, Error, Result};
use exhume_identify::{FileInspector, VersionIdentifier};

/// Inspector fake keyed by file name; unknown files report an error so the
/// scan's skip-and-continue path is exercised too.
struct FakeInspector {
    reports: HashMap<String, String>,
}

impl FakeInspector {
    fn new(reports: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            reports: reports
                .iter()
                .map(|(name, report)| (name.to_string(), report.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl FileInspector for FakeInspector {
    async fn inspect(&self, path: &Path) -> Result<String> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.reports
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::Detection(format!("no scripted report for {name}")))
    }
}

/// Chooser fake that replays scripted answers and records every prompt.
struct ScriptedChooser {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedChooser {
    fn new(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<(String, Vec<String>)> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Chooser for ScriptedChooser {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.to_vec()));
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .expect("chooser invoked without a scripted answer"))
    }

    fn multi_choose(&self, _prompt: &str, _options: &[String]) -> Result<Vec<String>> {
        panic!("multi_choose is not part of identification");
    }

    fn text_input(&self, _prompt: &str, _default: &str) -> Result<String> {
        panic!("text_input is not part of identification");
    }
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

#[tokio::test]
async fn empty_directory_yields_none_without_prompting() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "ibdata1");

    let chooser = ScriptedChooser::new(&[]);
    let identifier = VersionIdentifier::new(
        dir.path(),
        FakeInspector::new(&[]),
        chooser.clone(),
    );

    assert_eq!(identifier.identify().await.unwrap(), None);
    assert!(chooser.prompts().is_empty());
}

#[tokio::test]
async fn packed_frm_files_identify_legacy_mysql() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shop")).unwrap();
    touch(&dir.path().join("shop"), "orders.frm");
    touch(&dir.path().join("shop"), "users.frm");

    let report = "MySQL table definition file Version 9, MySQL version 50651";
    let inspector = FakeInspector::new(&[("orders.frm", report), ("users.frm", report)]);
    // A single unanimous candidate is still presented for confirmation.
    let chooser = ScriptedChooser::new(&["mysql:5.6 (2 artifacts)"]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser.clone());
    let tag = identifier.identify().await.unwrap().unwrap();
    assert_eq!(tag.as_str(), "mysql:5.6");

    let prompts = chooser.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(
        prompts[0].1,
        vec![
            "mysql:5.6 (2 artifacts)".to_string(),
            "None of these, try another method".to_string(),
        ]
    );
}

#[tokio::test]
async fn binlog_files_identify_modern_mysql() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "binlog.000003");

    let inspector = FakeInspector::new(&[(
        "binlog.000003",
        "MySQL replication log V5+, server version 8.0.44",
    )]);
    let chooser = ScriptedChooser::new(&["mysql:8.0 (1 artifact)"]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser);
    let tag = identifier.identify().await.unwrap().unwrap();
    assert_eq!(tag.as_str(), "mysql:8.0");
}

#[tokio::test]
async fn mixed_signatures_are_tallied_separately() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a.frm");
    touch(dir.path(), "b.frm");
    touch(dir.path(), "c.frm");

    let old = "MySQL table definition file, MySQL version 50651";
    let new = "MySQL table definition file, MySQL version 100600";
    let inspector = FakeInspector::new(&[("a.frm", old), ("b.frm", old), ("c.frm", new)]);
    let chooser = ScriptedChooser::new(&["mariadb:10.6 (1 artifact)"]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser.clone());
    let tag = identifier.identify().await.unwrap().unwrap();
    assert_eq!(tag.as_str(), "mariadb:10.6");

    let prompts = chooser.prompts();
    assert_eq!(
        prompts[0].1,
        vec![
            "mysql:5.6 (2 artifacts)".to_string(),
            "mariadb:10.6 (1 artifact)".to_string(),
            "None of these, try another method".to_string(),
        ]
    );
}

#[tokio::test]
async fn try_another_method_falls_through_to_binlogs() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "stale.frm");
    touch(dir.path(), "binlog.000007");

    let inspector = FakeInspector::new(&[
        ("stale.frm", "MySQL table definition file, MySQL version 50505"),
        ("binlog.000007", "MySQL replication log, server version 8.0.44"),
    ]);
    let chooser = ScriptedChooser::new(&[
        "None of these, try another method",
        "mysql:8.0 (1 artifact)",
    ]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser.clone());
    let tag = identifier.identify().await.unwrap().unwrap();
    assert_eq!(tag.as_str(), "mysql:8.0");
    assert_eq!(chooser.prompts().len(), 2);
}

#[tokio::test]
async fn deferring_every_strategy_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "t.frm");

    let inspector = FakeInspector::new(&[(
        "t.frm",
        "MySQL table definition file, MySQL version 50651",
    )]);
    let chooser = ScriptedChooser::new(&["None of these, try another method"]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser);
    assert_eq!(identifier.identify().await.unwrap(), None);
}

#[tokio::test]
async fn inspector_failures_skip_files_without_aborting() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "broken.frm");
    touch(dir.path(), "good.frm");

    // broken.frm has no scripted report, so inspection errors on it.
    let inspector = FakeInspector::new(&[(
        "good.frm",
        "MySQL table definition file, MySQL version 50744",
    )]);
    let chooser = ScriptedChooser::new(&["mysql:5.7 (1 artifact)"]);

    let identifier = VersionIdentifier::new(dir.path(), inspector, chooser);
    let tag = identifier.identify().await.unwrap().unwrap();
    assert_eq!(tag.as_str(), "mysql:5.7");
}
