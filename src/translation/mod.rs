/*!
 * Subtitle translation over a chain of backends.
 *
 * - `batch`: splitting lines into requests within backend limits
 * - `pipeline`: parse, translate with fallback, write
 */

pub use self::batch::split_into_batches;
pub use self::pipeline::{TranslationJob, TranslationOutcome, TranslationPipeline};

pub mod batch;
pub mod pipeline;
