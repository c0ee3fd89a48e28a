use url::form_urlencoded;

/// Query parameters of an inbound request.
///
/// Callers historically spelled parameter names in several ways, so lookups take a list of
/// aliases. Aliases are tried in priority order and compared case-insensitively; when a
/// name is repeated in the query the first occurrence wins.
#[derive(Clone, Debug, Default)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

/// Parameter names accepted for each logical input, in priority order.
pub mod aliases {
    pub const NAME: &[&str] = &["ofcFullname", "ofcfullname"];
    pub const STATE_AND_SITE: &[&str] = &["ofcstateandsite", "ofcStateandsite", "ofcStateAndSite"];
    pub const WORK_STATE: &[&str] = &["ofcWorkstate", "ofcworkstate"];
    pub const WORK_SITE: &[&str] = &["ofcWorksite", "ofcworksite"];
    pub const CALL_REASON: &[&str] = &["callreason", "CallReason"];
    pub const REASON_DEPARTMENT: &[&str] = &["callreasondepartment", "CallReasonDepartment"];
    pub const PHONE: &[&str] = &["ofcPhone", "ofcphone"];
    pub const EMAIL: &[&str] = &["ofcEmail", "ofcemail"];
    pub const CALLER_ID: &[&str] = &["callerId", "callerID", "CallerId"];
    pub const CALL_GUID: &[&str] = &["callguid", "callGuid", "CallGuid"];
    pub const TIME_COMB: &[&str] = &["ofctimecomb", "ofcTimeComb", "ofcTimeCombo"];
    pub const MODE: &[&str] = &["mode"];
    pub const DEBUG: &[&str] = &["debug"];
    pub const SECRET: &[&str] = &["secret", "Secret", "SECRET"];
}

const LOGGED_VALUE_LEN: usize = 64;

impl Params {
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Params { pairs }
    }

    /// Returns the first non-empty value found under any of `aliases`.
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.pairs
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(alias))
                .map(|(_, value)| value.as_str())
                .filter(|value| !value.is_empty())
        })
    }

    pub fn get_or<'a>(&'a self, aliases: &[&str], default: &'a str) -> &'a str {
        self.get(aliases).unwrap_or(default)
    }

    /// Parameters safe to log: the shared secret is dropped and values are truncated.
    pub fn scrubbed(&self) -> Vec<(&str, String)> {
        self.pairs
            .iter()
            .filter(|(name, _)| !aliases::SECRET.iter().any(|s| name.eq_ignore_ascii_case(s)))
            .map(|(name, value)| (name.as_str(), truncate(value, LOGGED_VALUE_LEN)))
            .collect()
    }
}

/// Truncates to at most `max` characters, never splitting a character.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
