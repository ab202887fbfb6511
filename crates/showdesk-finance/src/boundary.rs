//! Translation of service results into caller-facing responses.

use showdesk_core::error::{ErrorResponse, ShowdeskResult};
use tracing::{debug, error};

/// Outermost error handler for service calls.
#[derive(Debug, Clone, Copy)]
pub struct Boundary {
    expose_detail: bool,
}

impl Boundary {
    /// `expose_detail` attaches internal error text to responses; only
    /// non-production deployments set it.
    pub fn new(expose_detail: bool) -> Self {
        Self { expose_detail }
    }

    /// Map a service result to a structured response, logging unanticipated
    /// failures with full detail.
    pub fn respond<T>(
        &self,
        operation: &'static str,
        result: ShowdeskResult<T>,
    ) -> Result<T, ErrorResponse> {
        result.map_err(|err| {
            if err.is_domain() {
                debug!(operation, code = err.code(), error = %err, "Request rejected");
            } else {
                error!(operation, error = %err, "Request failed");
            }
            err.to_response(self.expose_detail)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showdesk_core::error::ShowdeskError;

    #[test]
    fn passes_success_through() {
        let boundary = Boundary::new(false);
        assert_eq!(boundary.respond("count", Ok(3)).unwrap(), 3);
    }

    #[test]
    fn domain_error_keeps_code_and_message() {
        let boundary = Boundary::new(false);
        let resp = boundary
            .respond::<()>("append_cost", Err(ShowdeskError::ContractNotSigned))
            .unwrap_err();
        assert_eq!(resp.code, "CONTRACT_NOT_SIGNED");
        assert!(resp.detail.is_none());
    }

    #[test]
    fn database_error_is_opaque_unless_exposed() {
        let failure = || Err::<(), _>(ShowdeskError::Database("tx conflict on show:42".into()));

        let prod = Boundary::new(false).respond("close_road", failure()).unwrap_err();
        assert_eq!(prod.code, "INTERNAL_ERROR");
        assert!(!prod.message.contains("show:42"));
        assert!(prod.detail.is_none());

        let dev = Boundary::new(true).respond("close_road", failure()).unwrap_err();
        assert!(dev.detail.unwrap().contains("show:42"));
    }
}
