use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracker::{Board, Column, ColumnValues, Record, TrackerClient, TrackerError};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create { board_id: String, name: String },
    Update { record_id: String, columns: Vec<String> },
    ListColumns { board_id: String },
}

type UpdateRule = Box<dyn Fn(&ColumnValues) -> Result<(), TrackerError> + Send + Sync>;

/// Records every call and answers from canned results.
pub struct MockTracker {
    pub calls: Mutex<Vec<Call>>,
    create: Mutex<VecDeque<Result<Record, TrackerError>>>,
    update: UpdateRule,
}

impl MockTracker {
    /// Creation succeeds with record "1001", every update succeeds.
    pub fn new() -> Self {
        Self::with_create(Ok(Record {
            id: "1001".into(),
            name: "Jane Doe".into(),
        }))
    }

    pub fn with_create(result: Result<Record, TrackerError>) -> Self {
        MockTracker {
            calls: Mutex::new(Vec::new()),
            create: Mutex::new(VecDeque::from([result])),
            update: Box::new(|_| Ok(())),
        }
    }

    pub fn on_update(
        mut self,
        rule: impl Fn(&ColumnValues) -> Result<(), TrackerError> + Send + Sync + 'static,
    ) -> Self {
        self.update = Box::new(rule);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { columns, .. } => Some(columns),
                _ => None,
            })
            .collect()
    }
}

pub fn transport_error() -> TrackerError {
    TrackerError::Transport("connection reset".into())
}

pub fn application_error(message: &str) -> TrackerError {
    TrackerError::Application {
        status: 200,
        errors: vec![message.to_string()],
        raw: format!(r#"{{"errors":[{{"message":"{message}"}}]}}"#),
    }
}

#[async_trait]
impl TrackerClient for MockTracker {
    async fn create_record(&self, board_id: &str, name: &str) -> Result<Record, TrackerError> {
        self.calls.lock().unwrap().push(Call::Create {
            board_id: board_id.into(),
            name: name.into(),
        });
        self.create
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TrackerError::Transport("unexpected create".into())))
    }

    async fn update_fields(
        &self,
        _board_id: &str,
        record_id: &str,
        values: &ColumnValues,
    ) -> Result<(), TrackerError> {
        self.calls.lock().unwrap().push(Call::Update {
            record_id: record_id.into(),
            columns: values.keys().cloned().collect(),
        });
        (self.update)(values)
    }

    async fn list_columns(&self, board_id: &str) -> Result<Board, TrackerError> {
        self.calls.lock().unwrap().push(Call::ListColumns {
            board_id: board_id.into(),
        });
        Ok(Board {
            id: board_id.into(),
            name: "Calls".into(),
            columns: vec![Column {
                id: "text_mktj4gmt".into(),
                title: "Site".into(),
                column_type: "text".into(),
            }],
        })
    }
}
