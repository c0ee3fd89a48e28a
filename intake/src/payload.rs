use crate::columns::{ColumnIds, Field};
use crate::email::sanitize_email;
use crate::extract::CallEvent;
use crate::normalized::Normalized;
use crate::params::truncate;
use crate::phone::{NormalizedPhone, normalize_phone};
use crate::routing::DepartmentRouter;
use chrono::{DateTime, Utc};
use tracker::{ColumnValue, ColumnValues};

const PHONE_REGION: &str = "US";
const PHONE_SAMPLE_LEN: usize = 32;
const EMAIL_SAMPLE_LEN: usize = 64;

/// Builds the column values for `event`.
///
/// A column is present only when its value is non-empty after normalization. Values that
/// were provided but could not be normalized are left out and logged. The received-at
/// column is always present.
pub fn build_payload(
    event: &CallEvent,
    columns: &ColumnIds,
    router: &DepartmentRouter,
    now: DateTime<Utc>,
) -> ColumnValues {
    let mut payload = ColumnValues::new();
    let mut put = |field: Field, value: ColumnValue| {
        payload.insert(columns.get(field).to_string(), value);
    };

    if let Some(label) = non_empty(&event.division) {
        put(Field::Division, ColumnValue::Label { label });
    }
    if let Some(label) = non_empty(&event.department) {
        put(Field::Department, ColumnValue::Label { label });
    }

    let texts = [
        (Field::Site, Some(&event.site)),
        (Field::Issue, Some(&event.issue)),
        (Field::InOut, event.in_out.as_ref()),
        (Field::StartTime, event.start_time.as_ref()),
        (Field::EndTime, event.end_time.as_ref()),
        (Field::CallGuid, event.call_guid.as_ref()),
    ];
    for (field, value) in texts {
        if let Some(text) = value.and_then(|v| non_empty(v)) {
            put(field, ColumnValue::Text(text));
        }
    }

    if let Some(mailbox) = router.route(&event.division, &event.department) {
        put(Field::DepartmentMailbox, ColumnValue::Text(mailbox.to_string()));
    }

    for (field, raw, what) in [
        (Field::Phone, &event.phone, "phone"),
        (Field::CallerIdPhone, &event.caller_id, "caller id"),
    ] {
        match Normalized::from_input(Some(raw.as_str()), normalize_phone) {
            Normalized::Valid(NormalizedPhone { e164, .. }) => put(
                field,
                ColumnValue::Phone {
                    phone: e164,
                    country_short_name: PHONE_REGION.to_string(),
                },
            ),
            Normalized::Rejected => tracing::warn!(
                sample = %truncate(raw, PHONE_SAMPLE_LEN),
                "Could not normalize {what}, leaving it out"
            ),
            Normalized::Unset => {}
        }
    }

    let email = Normalized::from_input(Some(event.email.as_str()), |raw| {
        Some(sanitize_email(raw)).filter(|email| !email.is_empty())
    });
    match email {
        Normalized::Valid(email) => put(
            Field::Email,
            ColumnValue::Email {
                text: email.clone(),
                email,
            },
        ),
        Normalized::Rejected => tracing::warn!(
            sample = %truncate(&event.email, EMAIL_SAMPLE_LEN),
            "Email could not be sanitized, leaving it out"
        ),
        Normalized::Unset => {}
    }

    put(
        Field::ReceivedAt,
        ColumnValue::DateTime {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
        },
    );

    payload
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
