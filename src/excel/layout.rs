//! Perfiles de disposición de las fuentes.
//!
//! Cada variante de formato publicada por las entidades (posición del
//! encabezado, columna de la operadora, filas a escanear) vive aquí como dato.
//! Un nuevo formato se soporta agregando un perfil, no editando el parser.

/// Hojas del libro de demanda de la UPME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemandSheetKind {
    /// Hoja con los tres escenarios ("Esc Alto, Medio y Bajo").
    Scenarios,
    /// Desglose regional del escenario medio.
    Regional,
    /// Desglose sectorial del escenario medio.
    Sectorial,
    /// Archivo independiente por sector (variante alternativa del paquete).
    SectorFile,
}

impl DemandSheetKind {
    pub fn label(&self) -> &'static str {
        match self {
            DemandSheetKind::Scenarios => "scenarios",
            DemandSheetKind::Regional => "regional",
            DemandSheetKind::Sectorial => "sectorial",
            DemandSheetKind::SectorFile => "sector_file",
        }
    }

    pub fn profile(&self) -> LayoutProfile {
        match self {
            DemandSheetKind::Scenarios => LayoutProfile::Tabular(TabularLayout { header_offset: 1 }),
            DemandSheetKind::Regional
            | DemandSheetKind::Sectorial
            | DemandSheetKind::SectorFile => LayoutProfile::Tabular(TabularLayout { header_offset: 3 }),
        }
    }
}

/// Hoja "limpia": el encabezado real está `header_offset` filas bajo la fila 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularLayout {
    pub header_offset: usize,
}

/// Hoja pivoteada con metadatos arriba (declaraciones de producción).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotLayout {
    /// Texto que identifica la fila de años (comparación en minúsculas).
    pub year_marker: &'static str,
    /// Filas a revisar buscando la fila de años.
    pub row_scan_budget: usize,
    /// Columna con la operadora; filas con esta celda vacía se ignoran.
    pub operator_column: usize,
    /// Distancia entre la fila de años y la de meses.
    pub month_row_gap: usize,
}

impl PivotLayout {
    /// Formato de las declaraciones de producción del Ministerio de Minas.
    pub const MINENERGIA: PivotLayout = PivotLayout {
        year_marker: "año",
        row_scan_budget: 15,
        operator_column: 2,
        month_row_gap: 1,
    };
}

impl Default for PivotLayout {
    fn default() -> Self {
        PivotLayout::MINENERGIA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutProfile {
    Tabular(TabularLayout),
    Pivoted(PivotLayout),
}

impl LayoutProfile {
    /// Declaraciones de producción: hojas pivoteadas del Ministerio de Minas.
    pub const PRODUCTION: LayoutProfile = LayoutProfile::Pivoted(PivotLayout::MINENERGIA);

    pub fn header_offset(&self) -> Option<usize> {
        match self {
            LayoutProfile::Tabular(t) => Some(t.header_offset),
            LayoutProfile::Pivoted(_) => None,
        }
    }

    pub fn pivot(&self) -> Option<&PivotLayout> {
        match self {
            LayoutProfile::Pivoted(p) => Some(p),
            LayoutProfile::Tabular(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayoutProfile::Tabular(_) => "tabular",
            LayoutProfile::Pivoted(_) => "pivoted",
        }
    }
}
