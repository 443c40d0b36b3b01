//! Módulo `excel`: de bytes descargados a tuplas largas.
//!
//! Submódulos:
//! - `io`: helpers de celdas y apertura de libros en memoria
//! - `bundle`: expansión de paquetes ZIP a libros de Excel
//! - `layout`: perfiles de disposición (desplazamientos, columnas ancla)
//! - `locator`: qué archivos y hojas alimentan cada tabla
//! - `tabular`: forma A, hojas limpias que se despivotan
//! - `pivot`: forma B, hojas pivoteadas de producción

/// Helpers de IO y lectura de celdas
pub mod io;

/// Paquetes ZIP con varios libros
pub mod bundle;

/// Perfiles de disposición de hojas
pub mod layout;

/// Selección de archivos y hojas
pub mod locator;

/// Despivote de hojas tabulares
pub mod tabular;

/// Recuperación de hojas pivoteadas
pub mod pivot;

pub use bundle::{open_bundle, BundleEntry};
pub use io::{Grid, Workbook};
pub use layout::{DemandSheetKind, LayoutProfile, PivotLayout, TabularLayout};
pub use locator::{locate_demand_sheets, locate_production_files, ProductionCandidate};
pub use pivot::{recover_sheet, ProductionTuple};
pub use tabular::{unpivot, LongTuple, TabularSheet, Unpivoted};
