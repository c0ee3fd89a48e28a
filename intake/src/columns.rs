use serde::Deserialize;

/// Logical fields written to a record, each mapped to a board column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Division,
    Department,
    Site,
    Issue,
    InOut,
    StartTime,
    EndTime,
    CallGuid,
    DepartmentMailbox,
    Phone,
    CallerIdPhone,
    Email,
    ReceivedAt,
}

/// Column ids of the target board.
///
/// The ids are opaque; they are whatever the board was created with. Every field may be
/// overridden individually from configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnIds {
    pub division: String,
    pub department: String,
    pub site: String,
    pub issue: String,
    pub in_out: String,
    pub start_time: String,
    pub end_time: String,
    pub call_guid: String,
    pub department_mailbox: String,
    pub phone: String,
    pub caller_id_phone: String,
    pub email: String,
    pub received_at: String,
}

impl Default for ColumnIds {
    fn default() -> Self {
        ColumnIds {
            division: "color_mktd81zp".into(),
            department: "color_mktsk31h".into(),
            site: "text_mktj4gmt".into(),
            issue: "text_mktdb8pg".into(),
            in_out: "text_mktsvsns".into(),
            start_time: "text_mkv0t29z".into(),
            end_time: "text_mkv0nmq1".into(),
            call_guid: "text_mkv7j2fq".into(),
            department_mailbox: "text_mkv07gad".into(),
            phone: "phone_mktdphra".into(),
            caller_id_phone: "phone_mkv0p9q3".into(),
            email: "email_mktdyt3z".into(),
            received_at: "date4".into(),
        }
    }
}

impl ColumnIds {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Division => &self.division,
            Field::Department => &self.department,
            Field::Site => &self.site,
            Field::Issue => &self.issue,
            Field::InOut => &self.in_out,
            Field::StartTime => &self.start_time,
            Field::EndTime => &self.end_time,
            Field::CallGuid => &self.call_guid,
            Field::DepartmentMailbox => &self.department_mailbox,
            Field::Phone => &self.phone,
            Field::CallerIdPhone => &self.caller_id_phone,
            Field::Email => &self.email,
            Field::ReceivedAt => &self.received_at,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.iter().map(|field| (*field, self.get(*field)))
    }
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Division,
        Field::Department,
        Field::Site,
        Field::Issue,
        Field::InOut,
        Field::StartTime,
        Field::EndTime,
        Field::CallGuid,
        Field::DepartmentMailbox,
        Field::Phone,
        Field::CallerIdPhone,
        Field::Email,
        Field::ReceivedAt,
    ];
}
