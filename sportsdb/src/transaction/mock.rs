//! Scriptable in-memory driver for exercising the manager's failure paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::driver::{Driver, ExecResult, Value};
use crate::error::{DataError, DataResult};
use crate::query::PlaceholderStyle;

/// Sessions are numbered in `begin` order starting at 1.
#[derive(Debug, PartialEq, Eq)]
pub struct MockSession(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Begin(u64),
    Commit(u64),
    Rollback(u64),
    Query {
        session: Option<u64>,
        sql: String,
        params: Vec<Value>,
    },
    Disconnect,
}

#[derive(Default)]
struct MockState {
    next_session: u64,
    calls: Vec<MockCall>,
    fail_begin: bool,
    fail_commit: bool,
    failing_rollbacks: HashSet<u64>,
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

fn injected(what: &str) -> DataError {
    DataError::Driver(sqlx::Error::Protocol(format!("injected {what} failure")))
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fail_begin(&self, fail: bool) {
        self.state.lock().unwrap().fail_begin = fail;
    }

    pub fn fail_commit(&self, fail: bool) {
        self.state.lock().unwrap().fail_commit = fail;
    }

    pub fn fail_rollback_of(&self, session: u64) {
        self.state.lock().unwrap().failing_rollbacks.insert(session);
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl Driver for MockDriver {
    type Session = MockSession;
    type Row = Vec<Value>;

    const PLACEHOLDER_STYLE: PlaceholderStyle = PlaceholderStyle::DollarNumbered;

    async fn connect(&self) -> DataResult<()> {
        Ok(())
    }

    async fn disconnect(&self) {
        self.record(MockCall::Disconnect);
    }

    async fn begin(&self) -> DataResult<MockSession> {
        let mut state = self.state.lock().unwrap();
        if state.fail_begin {
            return Err(injected("begin"));
        }
        state.next_session += 1;
        let n = state.next_session;
        state.calls.push(MockCall::Begin(n));
        Ok(MockSession(n))
    }

    async fn commit(&self, session: MockSession) -> DataResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Commit(session.0));
        if state.fail_commit {
            return Err(injected("commit"));
        }
        Ok(())
    }

    async fn rollback(&self, session: MockSession) -> DataResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Rollback(session.0));
        if state.failing_rollbacks.contains(&session.0) {
            return Err(injected("rollback"));
        }
        Ok(())
    }

    async fn query(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut MockSession>,
    ) -> DataResult<Vec<Vec<Value>>> {
        self.record(MockCall::Query {
            session: session.map(|s| s.0),
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(vec![params.to_vec()])
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[Value],
        session: Option<&mut MockSession>,
    ) -> DataResult<ExecResult> {
        self.record(MockCall::Query {
            session: session.map(|s| s.0),
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(ExecResult {
            affected_rows: 1,
            insert_id: 0,
        })
    }
}
