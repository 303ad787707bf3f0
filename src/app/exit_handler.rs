//! Exit code logic for the harvester process.
//!
//! Single responsibility: map audit results to the process exit outcome. A
//! harvest that reaches its final flush always exits successfully.

use harvester_core::AuditReport;

use crate::ProcessExit;

/// An audit fails when any `downloaded` record does not verify.
pub(crate) fn determine_verify_exit(report: &AuditReport) -> ProcessExit {
    if report.is_clean() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
