//! Builds a [`CallEvent`] from tolerant, possibly legacy-encoded request parameters.
//!
//! Several inputs arrive as one "combined" parameter holding more than one logical value.
//! The current encoding joins the values with `|`; older callers join them with `+`.

use crate::params::{Params, aliases};

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_DEPARTMENT: &str = "Other";
const DEFAULT_CALLER_ID: &str = "Unknown";
const LOGGED_SAMPLE_LEN: usize = 80;

/// One inbound call, as reported by the telephony platform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallEvent {
    pub name: String,
    pub division: String,
    pub site: String,
    pub issue: String,
    pub department: String,
    pub phone: String,
    pub email: String,
    pub caller_id: String,
    pub call_guid: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub in_out: Option<String>,
}

/// A combined parameter split into its non-empty, trimmed parts.
#[derive(Debug, PartialEq)]
pub struct Combined<'a> {
    pub separator: char,
    pub parts: Vec<&'a str>,
}

impl<'a> Combined<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let separator = separator_for(raw);
        let parts = raw
            .split(separator)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        Combined { separator, parts }
    }

    fn join(&self, parts: &[&str]) -> String {
        parts.join(self.separator.to_string().as_str())
    }

    /// First part, and the remaining parts rejoined with the separator.
    pub fn head_and_rest(&self) -> (Option<&'a str>, String) {
        match self.parts.split_first() {
            Some((head, rest)) => (Some(*head), self.join(rest)),
            None => (None, String::new()),
        }
    }

    /// Leading parts rejoined with the separator, and the last part.
    ///
    /// A single part is returned as the leading text with no last part.
    pub fn init_and_last(&self) -> (String, Option<&'a str>) {
        match self.parts.as_slice() {
            [] => (String::new(), None),
            [only] => (only.to_string(), None),
            [init @ .., last] => (self.join(init), Some(*last)),
        }
    }
}

fn separator_for(raw: &str) -> char {
    if raw.contains('|') { '|' } else { '+' }
}

/// Start time, end time and in/out flag of a call.
#[derive(Debug, Default, PartialEq)]
pub struct TimeTriple {
    pub start: Option<String>,
    pub end: Option<String>,
    pub in_out: Option<String>,
    /// Non-empty parts after the third, which are dropped.
    pub ignored: usize,
}

impl TimeTriple {
    /// Parts are positional, so empty parts are kept as placeholders and become `None`.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(separator_for(raw)).map(str::trim);
        let mut next = || parts.next().filter(|p| !p.is_empty()).map(String::from);
        let (start, end, in_out) = (next(), next(), next());

        TimeTriple {
            start,
            end,
            in_out,
            ignored: parts.filter(|p| !p.is_empty()).count(),
        }
    }
}

impl CallEvent {
    pub fn from_params(params: &Params) -> Self {
        let (mut division, mut site) = params
            .get(aliases::STATE_AND_SITE)
            .map(|raw| {
                let combined = Combined::parse(raw);
                let (head, rest) = combined.head_and_rest();
                (head.unwrap_or_default().to_string(), rest)
            })
            .unwrap_or_default();
        if division.is_empty() {
            division = params.get_or(aliases::WORK_STATE, "").to_string();
        }
        if site.is_empty() {
            site = params.get_or(aliases::WORK_SITE, "").to_string();
        }

        let (issue, mut department) = params
            .get(aliases::CALL_REASON)
            .map(|raw| {
                let combined = Combined::parse(raw);
                let (init, last) = combined.init_and_last();
                (init, last.unwrap_or_default().to_string())
            })
            .unwrap_or_default();
        if department.is_empty() {
            department = params
                .get_or(aliases::REASON_DEPARTMENT, DEFAULT_DEPARTMENT)
                .to_string();
        }

        let times = params
            .get(aliases::TIME_COMB)
            .map(|raw| {
                let times = TimeTriple::parse(raw);
                if times.ignored > 0 {
                    tracing::warn!(
                        ignored = times.ignored,
                        sample = %crate::params::truncate(raw, LOGGED_SAMPLE_LEN),
                        "Time combination has extra parts, ignoring them"
                    );
                }
                times
            })
            .unwrap_or_default();

        CallEvent {
            name: params.get_or(aliases::NAME, DEFAULT_NAME).to_string(),
            division,
            site,
            issue,
            department,
            phone: params.get_or(aliases::PHONE, "").to_string(),
            email: params.get_or(aliases::EMAIL, "").to_string(),
            caller_id: params.get_or(aliases::CALLER_ID, DEFAULT_CALLER_ID).to_string(),
            call_guid: params.get(aliases::CALL_GUID).map(String::from),
            start_time: times.start,
            end_time: times.end,
            in_out: times.in_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(query: &str) -> CallEvent {
        CallEvent::from_params(&Params::from_query(Some(query)))
    }

    #[test]
    fn test_combined_separator_selection() {
        assert_eq!(
            Combined::parse("Arizona|Phoenix"),
            Combined {
                separator: '|',
                parts: vec!["Arizona", "Phoenix"]
            }
        );
        assert_eq!(
            Combined::parse(" Arizona + Phoenix "),
            Combined {
                separator: '+',
                parts: vec!["Arizona", "Phoenix"]
            }
        );
        assert_eq!(Combined::parse("a||b|").parts, vec!["a", "b"]);
    }

    #[test]
    fn test_division_and_site_both_encodings() {
        for query in ["ofcstateandsite=Arizona|Phoenix", "ofcstateandsite=Arizona%2BPhoenix"] {
            let ev = event(query);
            assert_eq!(ev.division, "Arizona");
            assert_eq!(ev.site, "Phoenix");
        }
    }

    #[test]
    fn test_site_keeps_remaining_parts() {
        let ev = event("ofcStateAndSite=Texas|Dallas|North");
        assert_eq!(ev.division, "Texas");
        assert_eq!(ev.site, "Dallas|North");
    }

    #[test]
    fn test_division_and_site_fall_back_independently() {
        let ev = event("ofcWorkstate=Ohio&ofcWorksite=Columbus");
        assert_eq!(ev.division, "Ohio");
        assert_eq!(ev.site, "Columbus");

        let ev = event("ofcstateandsite=Ohio&ofcworksite=Dayton");
        assert_eq!(ev.division, "Ohio");
        assert_eq!(ev.site, "Dayton");
    }

    #[test]
    fn test_reason_last_part_is_department() {
        let ev = event("callreason=Billing%2BComplaint|Operations");
        assert_eq!(ev.issue, "Billing+Complaint");
        assert_eq!(ev.department, "Operations");

        let ev = event("callreason=Lost%2BCard%2BPayroll");
        assert_eq!(ev.issue, "Lost+Card");
        assert_eq!(ev.department, "Payroll");
    }

    #[test]
    fn test_single_reason_uses_department_fallback() {
        let ev = event("callreason=Billing&callreasondepartment=Sales");
        assert_eq!(ev.issue, "Billing");
        assert_eq!(ev.department, "Sales");

        let ev = event("callreason=Billing");
        assert_eq!(ev.department, "Other");
    }

    #[test]
    fn test_defaults() {
        let ev = event("");
        assert_eq!(ev.name, "Unknown");
        assert_eq!(ev.caller_id, "Unknown");
        assert_eq!(ev.department, "Other");
        assert_eq!(ev.division, "");
        assert_eq!(ev.call_guid, None);
        assert_eq!(ev.start_time, None);
    }

    #[test]
    fn test_time_triple() {
        let ev = event("ofctimecomb=09:00|09:15|in");
        assert_eq!(ev.start_time.as_deref(), Some("09:00"));
        assert_eq!(ev.end_time.as_deref(), Some("09:15"));
        assert_eq!(ev.in_out.as_deref(), Some("in"));
    }

    #[test]
    fn test_time_triple_positional_gaps() {
        assert_eq!(
            TimeTriple::parse("09:00||out"),
            TimeTriple {
                start: Some("09:00".into()),
                end: None,
                in_out: Some("out".into()),
                ignored: 0,
            }
        );
        assert_eq!(
            TimeTriple::parse("09:00"),
            TimeTriple {
                start: Some("09:00".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_extra_time_parts_are_dropped() {
        assert_eq!(
            TimeTriple::parse("09:00|09:15|in|extra|"),
            TimeTriple {
                start: Some("09:00".into()),
                end: Some("09:15".into()),
                in_out: Some("in".into()),
                ignored: 1,
            }
        );

        let ev = event("ofcFullname=Jane&ofcTimeCombo=09:00|09:15|in|extra");
        assert_eq!(ev.name, "Jane");
        assert_eq!(ev.start_time.as_deref(), Some("09:00"));
        assert_eq!(ev.end_time.as_deref(), Some("09:15"));
        assert_eq!(ev.in_out.as_deref(), Some("in"));
    }

    #[test]
    fn test_values_are_not_truncated_at_extraction() {
        let long = "n".repeat(400);
        let ev = event(&format!("ofcFullname={long}"));
        assert_eq!(ev.name.len(), 400);
    }
}
