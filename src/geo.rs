//! Nombres de departamentos y regiones de planeación de la UPME.

/// Etiqueta de la fuente (en mayúsculas) → nombre canónico.
const DEPARTMENT_NAMES: &[(&str, &str)] = &[
    ("LA GUAJIRA", "La Guajira"),
    ("MAGDALENA", "Magdalena"),
    ("ATLÁNTICO", "Atlántico"),
    ("ATLANTICO", "Atlántico"),
    ("CESAR", "Cesar"),
    ("BOLÍVAR", "Bolívar"),
    ("BOLIVAR", "Bolívar"),
    ("SUCRE", "Sucre"),
    ("CÓRDOBA", "Córdoba"),
    ("CORDOBA", "Córdoba"),
    ("NORTE DE SANTANDER", "Norte de Santander"),
    ("SANTANDER", "Santander"),
    ("BOYACÁ", "Boyacá"),
    ("BOYACA", "Boyacá"),
    ("ANTIOQUIA", "Antioquia"),
    ("CALDAS", "Caldas"),
    ("RISARALDA", "Risaralda"),
    ("QUINDÍO", "Quindío"),
    ("QUINDIO", "Quindío"),
    ("CUNDINAMARCA", "Cundinamarca"),
    ("BOGOTÁ D.C.", "Bogotá D.C."),
    ("BOGOTA D.C.", "Bogotá D.C."),
    ("BOGOTÁ", "Bogotá D.C."),
    ("BOGOTA", "Bogotá D.C."),
    ("TOLIMA", "Tolima"),
    ("HUILA", "Huila"),
    ("CHOCÓ", "Chocó"),
    ("CHOCO", "Chocó"),
    ("VALLE DEL CAUCA", "Valle del Cauca"),
    ("VALLE", "Valle del Cauca"),
    ("CAUCA", "Cauca"),
    ("NARIÑO", "Nariño"),
    ("NARINO", "Nariño"),
    ("ARAUCA", "Arauca"),
    ("CASANARE", "Casanare"),
    ("META", "Meta"),
    ("VICHADA", "Vichada"),
    ("GUAVIARE", "Guaviare"),
    ("CAQUETÁ", "Caquetá"),
    ("CAQUETA", "Caquetá"),
    ("PUTUMAYO", "Putumayo"),
    ("VAUPÉS", "Vaupés"),
    ("VAUPES", "Vaupés"),
    ("GUAINÍA", "Guainía"),
    ("GUAINIA", "Guainía"),
    ("AMAZONAS", "Amazonas"),
    ("SAN ANDRÉS Y PROVIDENCIA", "San Andrés y Providencia"),
    ("SAN ANDRES Y PROVIDENCIA", "San Andrés y Providencia"),
    ("SAN ANDRÉS", "San Andrés y Providencia"),
    ("SAN ANDRES", "San Andrés y Providencia"),
];

/// Nombre canónico del departamento. Los nombres fuera de la tabla quedan en
/// "title case" simple ("SAN JOSE DEL GUAVIARE" → "San Jose Del Guaviare").
pub fn canonical_department(raw: &str) -> String {
    let key = raw.trim().to_uppercase();
    if key.is_empty() {
        return String::new();
    }
    match DEPARTMENT_NAMES.iter().find(|(k, _)| *k == key) {
        Some((_, name)) => name.to_string(),
        None => title_case(raw.trim()),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Regiones de planeación de la UPME y sus departamentos.
///
/// Santander figura en NorOriente y en Magdalena Medio; al repartir la demanda
/// regional ese departamento recibe dos porciones. Se conserva así.
pub const UPME_REGIONS: &[(&str, &[&str])] = &[
    ("Costa", &["La Guajira", "Magdalena", "Atlántico", "Cesar", "Bolívar", "Sucre", "Córdoba"]),
    ("NorOriente", &["Norte de Santander", "Santander", "Arauca"]),
    ("Magdalena Medio", &["Santander", "Boyacá"]),
    ("Centro", &["Cundinamarca", "Bogotá D.C."]),
    ("Noroccidente", &["Antioquia", "Chocó"]),
    ("CQR", &["Caldas", "Quindío", "Risaralda"]),
    ("Tolima Grande", &["Tolima", "Huila"]),
    ("Suroccidente", &["Valle del Cauca", "Cauca", "Nariño"]),
    ("Sur", &["Putumayo", "Caquetá"]),
    ("Llanos", &["Meta", "Casanare", "Vichada", "Guaviare"]),
];

/// Departamentos de una región (comparación sin distinguir mayúsculas).
pub fn region_departments(region: &str) -> Option<&'static [&'static str]> {
    let key = region.trim().to_lowercase();
    UPME_REGIONS
        .iter()
        .find(|(name, _)| name.to_lowercase() == key)
        .map(|(_, deps)| *deps)
}

/// Reparte un valor regional en partes iguales entre sus departamentos.
/// Una región desconocida devuelve un vector vacío.
pub fn split_region_demand(region: &str, value: f64) -> Vec<(&'static str, f64)> {
    match region_departments(region) {
        Some(deps) if !deps.is_empty() => {
            let share = value / deps.len() as f64;
            deps.iter().map(|d| (*d, share)).collect()
        }
        _ => Vec::new(),
    }
}
