//! HTML rendering of the cumulative report.

use super::model::{
    FilmArrayResult, InstrumentResults, OlympusResult, PatientInfo, ResultSection, SciexResult,
};
use crate::parser::olympus::Analyte;

/// Shown for NULL values
const MISSING: &str = "-";

const STYLE: &str = r#"
@page { size: a4 portrait; margin: 1.5cm; }
body { font-family: Helvetica, Arial, sans-serif; font-size: 10pt; color: #222; }
h1 { font-size: 16pt; margin: 0; }
h2 { font-size: 12pt; border-bottom: 1px solid #999; margin-top: 18pt; }
h3 { font-size: 10pt; margin: 8pt 0 2pt 0; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 2pt 4pt; border-bottom: 1px solid #ddd; }
.meta { color: #555; font-size: 9pt; }
.footer { margin-top: 24pt; font-size: 8pt; color: #555; }
"#;

/// Everything that goes into one report document.
#[derive(Debug, Clone, Copy)]
pub struct ReportDocument<'a> {
    pub lab_name: &'a str,
    /// Report timestamp, already formatted (`MM/DD/YYYY at HH:MM`)
    pub reported_at: &'a str,
    pub patient: &'a PatientInfo,
    pub sections: &'a [ResultSection],
}

pub fn render_document(doc: &ReportDocument<'_>) -> String {
    let mut specs = String::new();
    for section in doc.sections {
        specs.push_str(&render_section(section, doc.reported_at));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{style}</style>\n</head>\n\
         <body>\n{header}{title_date}{patient_info}{specs}{footer}</body>\n</html>\n",
        style = STYLE,
        header = render_header(doc.lab_name),
        title_date = render_title_date(doc.reported_at),
        patient_info = render_patient_info(doc.patient),
        specs = specs,
        footer = render_footer(doc.reported_at, doc.patient),
    )
}

fn render_header(lab_name: &str) -> String {
    format!("<h1>{}</h1>\n", escape(lab_name))
}

fn render_title_date(reported_at: &str) -> String {
    format!(
        "<h2>Cumulative Report</h2>\n<p class=\"meta\">Reported: {}</p>\n",
        escape(reported_at)
    )
}

fn render_patient_info(patient: &PatientInfo) -> String {
    format!(
        "<table class=\"patient\">\n\
         <tr><th>First name</th><td>{}</td><th>Last name</th><td>{}</td></tr>\n\
         <tr><th>Gender</th><td>{}</td><th>Patient ID</th><td>{}</td></tr>\n\
         </table>\n",
        escape(&patient.first_name),
        escape(&patient.last_name),
        escape(&patient.gender),
        escape(&patient.id),
    )
}

fn render_footer(reported_at: &str, patient: &PatientInfo) -> String {
    format!(
        "<p class=\"footer\">{}. Patient ID: {}. Reported {}.</p>\n",
        escape(&patient.full_name()),
        escape(&patient.id),
        escape(reported_at),
    )
}

/// One specimen's block; the layout depends on the instrument.
pub fn render_section(section: &ResultSection, reported_at: &str) -> String {
    let mut html = String::new();

    let title = match &section.results {
        InstrumentResults::Olympus(_) => "Drug Screen (Olympus)",
        InstrumentResults::Sciex(_) => "Quantitation (Sciex)",
        InstrumentResults::FilmArray(_) => "Molecular Panel (FilmArray)",
    };
    html.push_str(&format!("<h2>{}</h2>\n", title));
    html.push_str(&format!(
        "<p class=\"meta\">Accession number: {} | Specimen type: {} | Requested: {} | Reported: {}</p>\n",
        escape(&section.accession_number),
        escape(&section.specimen_type),
        escape(section.requested_at.as_deref().unwrap_or(MISSING)),
        escape(reported_at),
    ));

    match &section.results {
        InstrumentResults::Olympus(results) => {
            for result in results {
                render_olympus(&mut html, result);
            }
        },
        InstrumentResults::Sciex(results) => render_sciex(&mut html, results),
        InstrumentResults::FilmArray(results) => {
            for result in results {
                render_film_array(&mut html, result);
            }
        },
    }

    html
}

fn render_olympus(html: &mut String, result: &OlympusResult) {
    html.push_str("<table>\n<tr><th>Analyte</th><th>Result</th></tr>\n");
    for analyte in Analyte::ALL {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(analyte.label()),
            cell(result.value(analyte)),
        ));
    }
    html.push_str("</table>\n");
}

fn render_sciex(html: &mut String, results: &[SciexResult]) {
    html.push_str(
        "<table>\n<tr><th>Component</th><th>Actual concentration</th>\
         <th>Calculated concentration</th></tr>\n",
    );
    for result in results {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            cell(result.component_name.as_deref()),
            cell(result.actual_concentration.as_deref()),
            cell(result.calculated_concentration.as_deref()),
        ));
    }
    html.push_str("</table>\n");
}

fn render_film_array(html: &mut String, result: &FilmArrayResult) {
    html.push_str(&format!(
        "<p>Test: {} ({})</p>\n",
        cell(result.test.test_name.as_deref()),
        cell(result.test.test_identifier.as_deref()),
    ));

    for group in &result.groups {
        html.push_str(&format!(
            "<h3>{}</h3>\n",
            cell(group.group.result_group_name.as_deref())
        ));
        html.push_str("<table>\n<tr><th>Target</th><th>Result</th></tr>\n");
        for item in &group.items {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                cell(item.result_test_name.as_deref()),
                cell(item.observation_value.as_deref()),
            ));
        }
        html.push_str("</table>\n");
    }
}

fn cell(value: Option<&str>) -> String {
    escape(value.unwrap_or(MISSING))
}

/// Escape text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
