//! Ready-made composers for the fleet's paperwork. Each takes a display-ready
//! data record plus the issuing company and returns finished PDF bytes; every
//! degradation (bad logo, missing signature, ragged table rows) is absorbed by
//! the builder, so composers fail only on construction or I/O faults.

use crate::builder::{DocumentBuilder, DocumentOptions, SignatureSlot, TextOptions};
use crate::error::Result;
use crate::model::{
    ClientsReportData, CompanyConfig, CranesReportData, FinancialReportData, InspectionData,
    InvoiceData, OperatorsReportData, ServiceReportData, ServicesReportData,
};
use crate::types::Pt;

pub const NO_PHOTOS_NOTICE: &str = "No se capturaron fotografías durante la inspección.";

pub fn invoice(data: &InvoiceData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "FACTURA", Some(&format!("Folio: {}", data.folio)));

    info_table(
        &mut doc,
        "Datos del cliente",
        &[
            ("Cliente", &data.client_name),
            ("RFC", &data.client_tax_id),
            ("Dirección", &data.client_address),
            ("Fecha", &data.date),
        ],
    );
    doc.add_spacer(Pt::from_mm(4.0));

    let rows: Vec<Vec<String>> = data
        .concepts
        .iter()
        .map(|concept| {
            vec![
                concept.description.clone(),
                concept.quantity.clone(),
                format_currency(concept.unit_price),
                format_currency(concept.amount),
            ]
        })
        .collect();
    doc.add_table(&["Concepto", "Cantidad", "P. unitario", "Importe"], &rows);
    doc.add_spacer(Pt::from_mm(4.0));

    let tax = data.subtotal * data.tax_rate / 100.0;
    let total = data.subtotal + tax;
    let totals = vec![
        vec!["Subtotal".to_string(), format_currency(data.subtotal)],
        vec![
            format!("IVA ({})", format_percent(data.tax_rate)),
            format_currency(tax),
        ],
        vec!["TOTAL".to_string(), format_currency(total)],
    ];
    doc.add_table(&["", ""], &totals);

    if let Some(notes) = data.notes.as_deref() {
        doc.add_spacer(Pt::from_mm(4.0));
        doc.add_text("Observaciones:", section_title());
        doc.add_text(notes, small_text());
    }

    finish(doc, company)
}

pub fn service_report(data: &ServiceReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(
        &mut doc,
        company,
        "REPORTE DE SERVICIO",
        Some(&format!("Folio: {}", data.folio)),
    );

    info_table(
        &mut doc,
        "Datos del servicio",
        &[
            ("Fecha", &data.date),
            ("Cliente", &data.client_name),
            ("Tipo de servicio", &data.service_type),
            ("Estado", &data.status),
        ],
    );
    doc.add_spacer(Pt::from_mm(4.0));
    info_table(
        &mut doc,
        "Equipo y operación",
        &[
            ("Grúa", &data.crane),
            ("Operador", &data.operator_name),
            ("Ubicación", &data.location),
        ],
    );
    doc.add_spacer(Pt::from_mm(4.0));

    doc.add_text("Descripción de la maniobra:", section_title());
    doc.add_text(&data.maneuver_description, TextOptions::default());
    doc.add_spacer(Pt::from_mm(10.0));

    doc.add_side_by_side_signatures(
        &signature_slot(
            "Firma del operador",
            &data.operator_name,
            data.operator_signature.as_deref(),
        ),
        &signature_slot(
            "Firma del cliente",
            &data.client_name,
            data.client_signature.as_deref(),
        ),
    );

    finish(doc, company)
}

pub fn inspection_certificate(data: &InspectionData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(
        &mut doc,
        company,
        "CERTIFICADO DE INSPECCIÓN",
        Some(&format!("Folio: {}", data.folio)),
    );

    info_table(
        &mut doc,
        "Datos de la inspección",
        &[
            ("Fecha", &data.date),
            ("Grúa", &data.crane),
            ("Inspector", &data.inspector_name),
            ("Resultado", &data.result),
        ],
    );
    doc.add_spacer(Pt::from_mm(4.0));

    doc.add_text("Lista de verificación:", section_title());
    doc.add_multi_column_list(&data.checklist, 2);
    doc.add_spacer(Pt::from_mm(4.0));

    doc.add_text("Evidencia fotográfica:", section_title());
    if data.photos.is_empty() {
        doc.add_text(NO_PHOTOS_NOTICE, small_text());
    } else {
        for photo in &data.photos {
            doc.add_image(photo, Pt::from_mm(60.0), Pt::from_mm(45.0));
        }
    }
    doc.add_spacer(Pt::from_mm(4.0));

    if !data.observations.is_empty() {
        doc.add_text("Observaciones:", section_title());
        doc.add_text(&data.observations, small_text());
        doc.add_spacer(Pt::from_mm(4.0));
    }

    doc.add_spacer(Pt::from_mm(6.0));
    doc.add_side_by_side_signatures(
        &signature_slot(
            "Firma del inspector",
            &data.inspector_name,
            data.inspector_signature.as_deref(),
        ),
        &signature_slot(
            "Firma del responsable",
            &data.responsible_name,
            data.responsible_signature.as_deref(),
        ),
    );

    finish(doc, company)
}

pub fn clients_report(data: &ClientsReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "REPORTE DE CLIENTES", Some(&data.period));
    doc.add_text(
        &format!("Total de clientes: {}", data.clients.len()),
        section_title(),
    );
    doc.add_spacer(Pt::from_mm(2.0));

    let rows: Vec<Vec<String>> = data
        .clients
        .iter()
        .map(|client| {
            vec![
                client.name.clone(),
                client.contact.clone(),
                client.phone.clone(),
                client.email.clone(),
                client.status.clone(),
            ]
        })
        .collect();
    doc.add_table(&["Cliente", "Contacto", "Teléfono", "Correo", "Estado"], &rows);

    finish(doc, company)
}

pub fn services_report(data: &ServicesReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "REPORTE DE SERVICIOS", Some(&data.period));
    doc.add_text(
        &format!("Total de servicios: {}", data.services.len()),
        section_title(),
    );
    doc.add_spacer(Pt::from_mm(2.0));

    let rows: Vec<Vec<String>> = data
        .services
        .iter()
        .map(|service| {
            vec![
                service.folio.clone(),
                service.date.clone(),
                service.client.clone(),
                service.service_type.clone(),
                service.crane.clone(),
                service.status.clone(),
            ]
        })
        .collect();
    doc.add_table(
        &["Folio", "Fecha", "Cliente", "Tipo", "Grúa", "Estado"],
        &rows,
    );

    finish(doc, company)
}

pub fn financial_report(data: &FinancialReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "REPORTE FINANCIERO", Some(&data.period));

    let income = format_currency(data.income);
    let costs = format_currency(data.costs);
    let margin = format_currency(data.income - data.costs);
    info_table(
        &mut doc,
        "Resumen del periodo",
        &[
            ("Ingresos", income.as_str()),
            ("Costos", costs.as_str()),
            ("Margen", margin.as_str()),
        ],
    );
    doc.add_spacer(Pt::from_mm(4.0));

    let rows: Vec<Vec<String>> = data
        .monthly
        .iter()
        .map(|row| {
            vec![
                row.month.clone(),
                format_currency(row.income),
                format_currency(row.costs),
                format_currency(row.income - row.costs),
            ]
        })
        .collect();
    doc.add_table(&["Mes", "Ingresos", "Costos", "Margen"], &rows);

    finish(doc, company)
}

pub fn operators_report(data: &OperatorsReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "REPORTE DE OPERADORES", Some(&data.period));
    doc.add_text(
        &format!("Total de operadores: {}", data.operators.len()),
        section_title(),
    );
    doc.add_spacer(Pt::from_mm(2.0));

    let rows: Vec<Vec<String>> = data
        .operators
        .iter()
        .map(|operator| {
            vec![
                operator.name.clone(),
                operator.license.clone(),
                operator.license_expiry.clone(),
                operator.status.clone(),
            ]
        })
        .collect();
    doc.add_table(&["Operador", "Licencia", "Vencimiento", "Estado"], &rows);

    finish(doc, company)
}

pub fn cranes_report(data: &CranesReportData, company: &CompanyConfig) -> Result<Vec<u8>> {
    let mut doc = start_document()?;
    compose_header(&mut doc, company, "REPORTE DE GRÚAS", Some(&data.period));
    doc.add_text(
        &format!("Total de grúas: {}", data.cranes.len()),
        section_title(),
    );
    doc.add_spacer(Pt::from_mm(2.0));

    let rows: Vec<Vec<String>> = data
        .cranes
        .iter()
        .map(|crane| {
            vec![
                crane.unit.clone(),
                crane.model.clone(),
                crane.capacity.clone(),
                crane.status.clone(),
            ]
        })
        .collect();
    doc.add_table(&["Unidad", "Modelo", "Capacidad", "Estado"], &rows);

    finish(doc, company)
}

/// Currency with cent-rounded integer grouping: whole amounts drop the
/// decimals ($100,000), fractional ones keep two ($1,234.50).
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = cents / 100;
    let fraction = cents % 100;
    let mut grouped = group_thousands(whole);
    if fraction != 0 {
        grouped.push_str(&format!(".{fraction:02}"));
    }
    if value < 0.0 && cents != 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Percentage with up to three decimals, trailing zeros trimmed: 16 -> "16%",
/// 16.5 -> "16.5%".
pub fn format_percent(value: f64) -> String {
    let milli = (value * 1000.0).round() as i64;
    let sign = if milli < 0 { "-" } else { "" };
    let whole = (milli / 1000).abs();
    let fraction = (milli % 1000).abs();
    if fraction == 0 {
        return format!("{sign}{whole}%");
    }
    let mut digits = format!("{fraction:03}");
    while digits.ends_with('0') {
        digits.pop();
    }
    format!("{sign}{whole}.{digits}%")
}

fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn start_document() -> Result<DocumentBuilder> {
    DocumentBuilder::new(DocumentOptions::default())
}

fn compose_header(
    doc: &mut DocumentBuilder,
    company: &CompanyConfig,
    title: &str,
    subtitle: Option<&str>,
) {
    if let Some(logo) = company.logo.as_deref() {
        doc.add_image(logo, Pt::from_mm(40.0), Pt::from_mm(16.0));
    }
    doc.add_header(&company.name, title, subtitle);
    let small = small_text();
    if !company.tax_id.is_empty() {
        doc.add_text(&format!("RFC: {}", company.tax_id), small);
    }
    if !company.address.is_empty() {
        doc.add_text(&company.address, small);
    }
    if !company.phone.is_empty() || !company.email.is_empty() {
        doc.add_text(
            &format!("Tel: {}  Correo: {}", company.phone, company.email),
            small,
        );
    }
    doc.add_spacer(Pt::from_mm(3.0));
}

fn info_table(doc: &mut DocumentBuilder, title: &str, entries: &[(&str, &str)]) {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|(label, value)| vec![label.to_string(), value.to_string()])
        .collect();
    doc.add_table(&[title, ""], &rows);
}

fn signature_slot(caption: &str, name: &str, payload: Option<&str>) -> SignatureSlot {
    let slot = SignatureSlot::new(caption, name);
    match payload {
        Some(payload) => slot.with_image(payload),
        None => slot,
    }
}

fn section_title() -> TextOptions {
    TextOptions::bold().with_size(Pt::from_f32(10.0))
}

fn small_text() -> TextOptions {
    TextOptions::default().with_size(Pt::from_f32(9.0))
}

fn finish(mut doc: DocumentBuilder, company: &CompanyConfig) -> Result<Vec<u8>> {
    doc.add_footer(&format!(
        "{} - Documento generado electrónicamente",
        company.name
    ));
    Ok(doc.to_bytes())
}
