//! Selección de archivos y hojas: qué se parsea y con qué perfil.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::excel::bundle::{base_name, BundleEntry};
use crate::excel::layout::DemandSheetKind;
use crate::models::{SourceLink, SECTOR_UNKNOWN};

/// Indicadores de que un enlace es una declaración de producción.
const PRODUCTION_TEXT_MARKERS: [&str; 1] = ["soporte"];
const PRODUCTION_HREF_MARKERS: [&str; 1] = ["declaracion"];
/// Plantillas publicadas junto a las declaraciones.
const PRODUCTION_EXCLUDED: [&str; 2] = ["plantilla", "formato"];

/// Archivo de producción candidato.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionCandidate {
    pub url: String,
    pub label: String,
    pub period: String,
}

/// Une un `href` relativo con la base del sitio.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href)
    }
}

/// Año inicial, separadores opcionales y un segundo año opcional.
static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(20\d{2})[_-]*(20\d{2})?").expect("valid regex"));

/// Periodo "2019" o "2019-2020" a partir del texto del enlace; "Unknown" si no hay.
pub fn extract_period(text: &str) -> String {
    PERIOD_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Filtra los enlaces de la página de producción.
///
/// `limit == 0` no acota la cantidad de archivos.
pub fn locate_production_files(links: &[SourceLink], base_url: &str, limit: usize) -> Vec<ProductionCandidate> {
    let mut out: Vec<ProductionCandidate> = Vec::new();
    for link in links {
        let href_low = link.href.to_lowercase();
        let text_low = link.text.to_lowercase();
        if ![".xlsx", ".xlsm", ".xls"].iter().any(|ext| href_low.contains(ext)) {
            continue;
        }
        let marked = PRODUCTION_TEXT_MARKERS.iter().any(|m| text_low.contains(m))
            || PRODUCTION_HREF_MARKERS.iter().any(|m| href_low.contains(m));
        if !marked {
            continue;
        }
        let candidate = ProductionCandidate {
            url: absolute_url(base_url, &link.href),
            label: link.text.clone(),
            period: extract_period(&format!("{}{}", link.text, link.href)),
        };
        // mismo URL: conserva la posición del primero y los datos del último
        match out.iter_mut().find(|c| c.url == candidate.url) {
            Some(existing) => *existing = candidate,
            None => out.push(candidate),
        }
    }

    out.retain(|c| {
        let low = c.label.to_lowercase();
        !PRODUCTION_EXCLUDED.iter().any(|m| low.contains(m))
    });
    log::info!("{} archivos únicos de producción", out.len());

    if limit > 0 && out.len() > limit {
        out.truncate(limit);
        log::info!("procesando {} archivos (limitado)", limit);
    }
    out
}

/// Hojas del libro de demanda que corresponden a cada tipo.
pub fn locate_demand_sheets(sheet_names: &[String]) -> Vec<(DemandSheetKind, String)> {
    let find = |pred: &dyn Fn(&str) -> bool| sheet_names.iter().find(|s| pred(&s.to_lowercase())).cloned();
    let mut out = Vec::new();
    if let Some(s) = find(&|s| s.contains("alto") && s.contains("bajo")) {
        out.push((DemandSheetKind::Scenarios, s));
    }
    if let Some(s) = find(&|s| s.contains("regional")) {
        out.push((DemandSheetKind::Regional, s));
    }
    if let Some(s) = find(&|s| s.contains("sectorial")) {
        out.push((DemandSheetKind::Sectorial, s));
    }
    out
}

/// Palabra clave en el nombre de archivo → sector. Gana la primera coincidencia.
pub const SECTOR_KEYWORDS: [(&str, &str); 10] = [
    ("residencial", "Residential"),
    ("industrial", "Industrial"),
    ("comercial", "Commercial"),
    ("vehicular", "Transport"),
    ("gnv", "Transport"),
    ("termoelectric", "Thermal Power"),
    ("termica", "Thermal Power"),
    ("refineria", "Refining"),
    ("petroquimic", "Petrochemical"),
    ("compresor", "Compression"),
];

/// Sector a partir del nombre de archivo, "Unknown" si no hay palabra clave.
pub fn sector_from_file_name(name: &str) -> String {
    let low = base_name(name).to_lowercase();
    SECTOR_KEYWORDS
        .iter()
        .find(|(kw, _)| low.contains(kw))
        .map(|(_, sector)| sector.to_string())
        .unwrap_or_else(|| SECTOR_UNKNOWN.to_string())
}

/// Reparto de los libros de un paquete de demanda.
#[derive(Debug, Default)]
pub struct DemandBundlePlan<'a> {
    /// Libros con las hojas de escenarios/regional/sectorial.
    pub primary: Vec<&'a BundleEntry>,
    /// Archivos por sector con su etiqueta.
    pub sector_files: Vec<(&'a BundleEntry, String)>,
}

/// El libro "agregada" es el principal; si no existe todos lo son. Los demás
/// libros con palabra clave de sector se procesan como archivos por sector.
///
/// `entries` son libros ya filtrados por `open_bundle`.
pub fn plan_demand_bundle(entries: &[BundleEntry]) -> DemandBundlePlan<'_> {
    let aggregate = entries.iter().find(|e| base_name(&e.name).to_lowercase().contains("agregada"));

    let mut plan = DemandBundlePlan::default();
    match aggregate {
        Some(primary) => {
            plan.primary.push(primary);
            for e in entries.iter().filter(|e| !std::ptr::eq(*e, primary)) {
                let sector = sector_from_file_name(&e.name);
                if sector != SECTOR_UNKNOWN {
                    plan.sector_files.push((e, sector));
                }
            }
        }
        None => plan.primary = entries.iter().collect(),
    }
    plan
}

/// Paquete de demanda publicado en la página de la UPME.
pub fn pick_demand_bundle_url(links: &[SourceLink], base_url: &str) -> Option<String> {
    links
        .iter()
        .find(|l| {
            let h = l.href.to_lowercase();
            h.contains("anexo") && h.contains("zip") && h.contains("gas")
        })
        .map(|l| absolute_url(base_url, &l.href))
}

/// Hoja del archivo por sector: la regional si existe, si no la primera.
pub fn sector_file_sheet(sheet_names: &[String]) -> Option<String> {
    sheet_names
        .iter()
        .find(|s| s.to_lowercase().contains("regional"))
        .or_else(|| sheet_names.first())
        .cloned()
}
