mod branding;
mod builder;
mod pdf;
mod table;

pub use branding::{load_logo, optional_logo, Logo, LogoData, ResourceError};
pub use builder::{build_report, Report, ReportError, ReportMetadata, REPORT_TITLE};
pub use pdf::{PdfRenderer, RenderError, ReportRenderer};
pub use table::write_recommendations_csv;
