use crate::data::fraction::FractionVector;
use crate::data::model::Table;
use crate::error::AbundanceError;
use crate::pipeline::{self, AbundanceResult, PipelineOptions};

// ---------------------------------------------------------------------------
// Request-scoped session state
// ---------------------------------------------------------------------------

/// Holds the last **successful** result for a single user session, so a
/// download handler can serve it after the chart is rendered.
///
/// A failed computation records a status message and leaves the previous
/// result untouched: the user never downloads a partial or stale-looking
/// artifact that doesn't match an error they were just shown.
#[derive(Debug, Default)]
pub struct Session {
    result: Option<AbundanceResult>,
    status: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Run the pipeline and store the result on success.
    pub fn compute(
        &mut self,
        identification: &Table,
        annotation: &Table,
        fractions: &FractionVector,
        options: &PipelineOptions,
    ) -> Result<&AbundanceResult, AbundanceError> {
        match pipeline::compute(identification, annotation, fractions, options) {
            Ok(result) => {
                self.status = None;
                Ok(&*self.result.insert(result))
            }
            Err(err) => {
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// The last successful result, if any computation has succeeded yet.
    pub fn last_result(&self) -> Option<&AbundanceResult> {
        self.result.as_ref()
    }

    /// Human-readable status of the last computation; `None` after a
    /// success.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
