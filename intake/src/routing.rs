use std::collections::HashMap;

const WILDCARD_DIVISION: &str = "any";
const KEY_SEPARATOR: char = '|';

const DEFAULT_MAILBOXES: &[(&str, &str)] = &[
    ("illinois|operations", "ilopsteam@secureone.com"),
    ("arizona|operations", "azopsteam@secureone.com"),
    ("alabama|operations", "alopsteam@secureone.com"),
    ("texas|operations", "txopsteam@secureone.com"),
    ("ohio|operations", "ohopsteam@secureone.com"),
    ("tennessee|operations", "tnopsteam@secureone.com"),
    ("indiana|operations", "inopsteam@secureone.com"),
    ("arizona|fingerprint", "azlivescan@secureone.com"),
    ("any|payroll", "payroll@secureone.com"),
    ("any|training", "training@secureone.com"),
    ("any|sales", "sales@secureone.com"),
    ("any|fingerprint", "livescan@secureone.com"),
    ("any|other", "dispatch@secureone.com"),
    ("any|human resources", "hr@secureone.com"),
];

/// Resolves a (division, department) pair to the mailbox that should be notified.
///
/// Table keys are `division|department`, lowercased. A division of `any` applies to
/// every division that has no entry of its own for the department.
#[derive(Clone, Debug, PartialEq)]
pub struct DepartmentRouter {
    mailboxes: HashMap<String, String>,
}

impl Default for DepartmentRouter {
    fn default() -> Self {
        DepartmentRouter::new(
            DEFAULT_MAILBOXES
                .iter()
                .map(|(key, mailbox)| (key.to_string(), mailbox.to_string())),
        )
    }
}

impl DepartmentRouter {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mailboxes = entries
            .into_iter()
            .map(|(key, mailbox)| (key.trim().to_lowercase(), mailbox))
            .collect();
        DepartmentRouter { mailboxes }
    }

    pub fn route(&self, division: &str, department: &str) -> Option<&str> {
        let division = division.trim().to_lowercase();
        let department = department.trim().to_lowercase();

        self.lookup(&division, &department)
            .or_else(|| self.lookup(WILDCARD_DIVISION, &department))
    }

    fn lookup(&self, division: &str, department: &str) -> Option<&str> {
        let key = format!("{division}{KEY_SEPARATOR}{department}");
        self.mailboxes.get(&key).map(String::as_str)
    }
}
