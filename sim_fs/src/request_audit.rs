//! Request audit log
//!
//! Test-visible record of every request the simulated service received,
//! in order, with its outcome. Auditing never affects the outcome itself.

use fs_api::{FsError, FsResult};

/// Kind of service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Connect,
    Disconnect,
    OpenArchive,
    CloseArchive,
    OpenFile,
    Read,
    Write,
    SetSize,
    CloseFile,
    DeleteFile,
    CreateDirectory,
    ControlArchive,
}

/// One audited request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,
    pub kind: RequestKind,
    pub outcome: Result<(), FsError>,
}

/// Request audit log
#[derive(Debug, Default)]
pub struct RequestAuditLog {
    entries: Vec<RequestRecord>,
    next_sequence: u64,
}

impl RequestAuditLog {
    /// Creates a new empty audit log
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Records a request and its outcome
    pub fn record<T>(&mut self, kind: RequestKind, outcome: &FsResult<T>) {
        let outcome = match outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        self.entries.push(RequestRecord {
            sequence: self.next_sequence,
            kind,
            outcome,
        });
        self.next_sequence += 1;
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries
    pub fn entries(&self) -> &[RequestRecord] {
        &self.entries
    }

    /// Returns the request kinds in order
    pub fn kinds(&self) -> Vec<RequestKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    /// Checks if any entry matches a predicate
    pub fn has_request<F>(&self, predicate: F) -> bool
    where
        F: Fn(&RequestRecord) -> bool,
    {
        self.entries.iter().any(predicate)
    }

    /// Counts requests of one kind
    pub fn count(&self, kind: RequestKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    /// Counts failed requests of one kind
    pub fn failures(&self, kind: RequestKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.outcome.is_err())
            .count()
    }

    /// Clears all entries; sequence numbers keep increasing
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_creation() {
        let log = RequestAuditLog::new();
        assert_eq!(log.len(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_record_outcomes() {
        let mut log = RequestAuditLog::new();
        log.record(RequestKind::Connect, &Ok::<u32, FsError>(7));
        log.record::<()>(RequestKind::OpenArchive, &Err(FsError::NoSpace));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].outcome, Ok(()));
        assert_eq!(log.entries()[1].outcome, Err(FsError::NoSpace));
        assert_eq!(log.failures(RequestKind::OpenArchive), 1);
        assert_eq!(log.failures(RequestKind::Connect), 0);
    }

    #[test]
    fn test_kinds_and_count() {
        let mut log = RequestAuditLog::new();
        log.record(RequestKind::OpenFile, &Ok::<(), FsError>(()));
        log.record(RequestKind::Write, &Ok::<(), FsError>(()));
        log.record(RequestKind::CloseFile, &Ok::<(), FsError>(()));
        log.record(RequestKind::Write, &Ok::<(), FsError>(()));

        assert_eq!(log.count(RequestKind::Write), 2);
        assert_eq!(
            log.kinds(),
            vec![
                RequestKind::OpenFile,
                RequestKind::Write,
                RequestKind::CloseFile,
                RequestKind::Write
            ]
        );
        assert!(log.has_request(|r| r.kind == RequestKind::CloseFile));
        assert!(!log.has_request(|r| r.kind == RequestKind::ControlArchive));
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let mut log = RequestAuditLog::new();
        log.record(RequestKind::Connect, &Ok::<(), FsError>(()));
        log.clear();
        log.record(RequestKind::Disconnect, &Ok::<(), FsError>(()));
        assert_eq!(log.entries()[0].sequence, 1);
    }
}
