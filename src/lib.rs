//! Paginated PDF composition for crane-fleet paperwork.
//!
//! `papeleo` builds the documents a crane service company hands out every
//! day: invoices, field service reports, inspection certificates, and
//! management reports. The heart of the crate is [`DocumentBuilder`], a
//! top-left-origin drawing surface with a vertical cursor: content flows down
//! the page and breaks onto the next one automatically, undecodable images
//! and missing signatures degrade to placeholder text instead of failing, and
//! finalization is non-destructive, so a document can be serialized, extended
//! and serialized again.
//!
//! Output is deterministic. Geometry runs on fixed-point [`Pt`] values, the
//! serializer emits PDF 1.4 with a stable object layout and no timestamps of
//! its own, and identical builder state always yields byte-identical files.
//! The footer's generation timestamp is the one deliberate source of
//! variation; [`DocumentOptions::with_fixed_footer_timestamp`] pins it.
//!
//! Ready-made composers cover the eight standard documents, [`render_batch`]
//! renders many of them on the rayon pool, and [`inspect_bytes`] parses
//! generated bytes back into per-page text for verification.

mod batch;
mod builder;
mod canvas;
mod debug;
mod error;
mod font;
mod image;
mod inspect;
mod model;
mod pdf;
mod reports;
mod types;

pub use batch::render_batch;
pub use builder::{
    DocumentBuilder, DocumentOptions, IMAGE_PLACEHOLDER, SIGNATURE_PLACEHOLDER, SignatureSlot,
    TextOptions,
};
pub use canvas::{Canvas, Command, Document, Page};
pub use error::{Error, Result};
pub use inspect::{InspectError, InspectReport, PageText, fingerprint, inspect_bytes};
pub use model::{
    ClientRow, ClientsReportData, CompanyConfig, CraneRow, CranesReportData, FinancialReportData,
    InspectionData, InvoiceConcept, InvoiceData, MonthlyBreakdownRow, OperatorRow,
    OperatorsReportData, ServiceReportData, ServiceRow, ServicesReportData,
};
pub use reports::{
    NO_PHOTOS_NOTICE, clients_report, cranes_report, financial_report, format_currency,
    format_percent, inspection_certificate, invoice, operators_report, service_report,
    services_report,
};
pub use types::{Color, Margins, Orientation, PaperFormat, Pt, Size};
