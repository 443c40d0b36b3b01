//! Acceso a las fuentes: bytes de un URL y enlaces de una página índice.
//!
//! `MirrorFetcher` sirve las fuentes desde un espejo local con la forma
//! `<raíz>/<host>/<ruta>`. Un URL con query se busca primero como
//! `<ruta>@<query saneada>` y luego sin query.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{EtlError, Result};
use crate::models::SourceLink;

/// Tiempos máximos por tipo de descarga.
pub mod timeouts {
    use std::time::Duration;

    pub const ROYALTIES_PAGE: Duration = Duration::from_secs(30);
    pub const PRODUCTION_INDEX: Duration = Duration::from_secs(10);
    pub const PRODUCTION_FILE: Duration = Duration::from_secs(120);
    pub const DEMAND_INDEX: Duration = Duration::from_secs(15);
    pub const DEMAND_BUNDLE: Duration = Duration::from_secs(60);
}

pub trait SourceFetcher {
    /// Anclas `(href, texto)` de una página índice.
    fn list_links(&self, page_url: &str, timeout: Duration) -> Result<Vec<SourceLink>>;

    /// Contenido crudo de un archivo o respuesta.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// Partes de un URL relevantes para el espejo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// Host sin credenciales ni puerto.
    pub host: String,
    /// Ruta tal como viene en el URL, sin '/' inicial ni final.
    pub path: String,
    /// Segmentos de la ruta ya decodificados (`%20` → ' ').
    pub segments: Vec<String>,
    pub query: Option<String>,
}

pub fn split_url(raw: &str) -> Result<UrlParts> {
    let url = Url::parse(raw).map_err(|e| EtlError::fetch(raw, e.to_string()))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| EtlError::fetch(raw, "missing host"))?;
    let segments = url
        .path_segments()
        .map(|parts| {
            parts
                .filter(|s| !s.is_empty())
                .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    Ok(UrlParts {
        host: host.to_string(),
        path: url.path().trim_matches('/').to_string(),
        segments,
        query: url.query().map(str::to_string),
    })
}

/// Caracteres fuera de `[A-Za-z0-9._=-]` pasan a '_'.
pub fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '=' | '-') { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    root: PathBuf,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MirrorFetcher { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn base_path(&self, parts: &UrlParts) -> PathBuf {
        let mut p = self.root.join(&parts.host);
        for segment in &parts.segments {
            p.push(segment);
        }
        p
    }

    /// Rutas candidatas del espejo para un URL, en orden de preferencia.
    pub fn candidate_paths(&self, url: &str) -> Result<Vec<PathBuf>> {
        let parts = split_url(url)?;
        let base = self.base_path(&parts);
        let mut out = Vec::with_capacity(2);
        if let Some(q) = parts.query.as_deref().filter(|q| !q.is_empty()) {
            let mut with_query = base.clone().into_os_string();
            with_query.push(format!("@{}", sanitize_query(q)));
            out.push(PathBuf::from(with_query));
        }
        out.push(base);
        Ok(out)
    }
}

impl SourceFetcher for MirrorFetcher {
    fn list_links(&self, page_url: &str, _timeout: Duration) -> Result<Vec<SourceLink>> {
        let parts = split_url(page_url)?;
        let dir = self.base_path(&parts);

        let links_file = dir.join("links.json");
        if links_file.is_file() {
            let raw = fs::read_to_string(&links_file)?;
            let links: Vec<SourceLink> = serde_json::from_str(&raw)?;
            log::info!("{}: {} enlaces (links.json)", page_url, links.len());
            return Ok(links);
        }

        if !dir.is_dir() {
            return Err(EtlError::fetch(page_url, format!("page not mirrored at {}", dir.display())));
        }
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let prefix = if parts.path.is_empty() { String::new() } else { format!("/{}", parts.path) };
        let links: Vec<SourceLink> = names
            .into_iter()
            .map(|name| SourceLink::new(format!("{}/{}", prefix, name), name))
            .collect();
        log::info!("{}: {} enlaces (listado del directorio)", page_url, links.len());
        Ok(links)
    }

    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        log::debug!("fetch {} (timeout {:?})", url, timeout);
        for path in self.candidate_paths(url)? {
            if path.is_file() {
                let bytes = fs::read(&path)?;
                log::debug!("{} → {} ({} bytes)", url, path.display(), bytes.len());
                return Ok(bytes);
            }
        }
        Err(EtlError::fetch(url, "not present in mirror"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parts() {
        let p = split_url("https://www.datos.gov.co/resource/j7js-yk74.json?$limit=5000&$offset=0").unwrap();
        assert_eq!(p.host, "www.datos.gov.co");
        assert_eq!(p.path, "resource/j7js-yk74.json");
        assert_eq!(p.query.as_deref(), Some("$limit=5000&$offset=0"));
        assert!(split_url("/relative/path").is_err());
        assert!(split_url("file:///tmp/x.xlsx").is_err());
    }

    #[test]
    fn credentials_and_port_stay_out_of_host() {
        let p = split_url("https://user@host.gov.co:8080/x#frag").unwrap();
        assert_eq!(p.host, "host.gov.co");
        assert_eq!(p.segments, vec!["x"]);
        assert_eq!(p.query, None);
    }

    #[test]
    fn query_sanitized_into_file_name() {
        assert_eq!(sanitize_query("$limit=5000&$offset=0"), "_limit=5000__offset=0");
        let m = MirrorFetcher::new("/m");
        let paths = m.candidate_paths("https://h.co/a/b.json?$limit=1").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/m/h.co/a/b.json@_limit=1"), PathBuf::from("/m/h.co/a/b.json")]);
    }

    #[test]
    fn percent_escapes_in_paths() {
        let p = split_url("https://docs.upme.gov.co/Documents/Anexo%20Gas.zip").unwrap();
        assert_eq!(p.segments, vec!["Documents", "Anexo Gas.zip"]);
        assert_eq!(p.path, "Documents/Anexo%20Gas.zip");
        let paths = MirrorFetcher::new("/m").candidate_paths("https://docs.upme.gov.co/Documents/Anexo%20Gas.zip").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/m/docs.upme.gov.co/Documents/Anexo Gas.zip")]);
    }

    #[test]
    fn reads_from_mirror_directory() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("www.minenergia.gov.co").join("es").join("gas");
        fs::create_dir_all(&page).unwrap();
        fs::write(page.join("declaracion_2023.xlsx"), b"PK").unwrap();

        let m = MirrorFetcher::new(dir.path());
        let links = m.list_links("https://www.minenergia.gov.co/es/gas/", timeouts::PRODUCTION_INDEX).unwrap();
        assert_eq!(links, vec![SourceLink::new("/es/gas/declaracion_2023.xlsx", "declaracion_2023.xlsx")]);

        let bytes = m
            .fetch("https://www.minenergia.gov.co/es/gas/declaracion_2023.xlsx", timeouts::PRODUCTION_FILE)
            .unwrap();
        assert_eq!(bytes, b"PK");
        assert!(m.fetch("https://www.minenergia.gov.co/otro.xlsx", timeouts::PRODUCTION_FILE).is_err());
    }

    #[test]
    fn links_json_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("upme.gov.co").join("demanda");
        fs::create_dir_all(&page).unwrap();
        fs::write(page.join("links.json"), r#"[{"href": "/Docs/Anexo_Gas.zip", "text": "Anexo"}, {"href": "/x.pdf"}]"#)
            .unwrap();
        let links = MirrorFetcher::new(dir.path())
            .list_links("https://upme.gov.co/demanda", timeouts::DEMAND_INDEX)
            .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].text, "");
    }
}
