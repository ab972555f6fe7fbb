// Dataset-spec grammar:
//
//   Spec      := DBSpec ('::' Tail)?
//   DBSpec    := 'mem' | ('http'|'https') '://' netloc ['/' path] ['?' query]
//   Tail      := DatasetName | '#' Hash | Path-with-dots-and-indices
//   DatasetName := [A-Za-z0-9/\-_]+
//
// `ldb:` is rejected by name (a scheme this core never supported), and a
// bare `mem` (no trailing colon) is the only way to spell the in-memory
// database.

use noms_base::{kind_err, Hash, Kind, Result};

use crate::path::{parse_path, Path};

#[derive(Clone, Debug, PartialEq)]
pub enum DbSpec {
    Mem,
    Http(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Tail {
    Dataset(String),
    Hash(Hash),
    Path(Path),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSpec {
    pub db: DbSpec,
    pub tail: Option<Tail>,
}

fn is_dataset_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_')
}

pub fn parse_dataset_spec(src: &str) -> Result<DatasetSpec> {
    if let Some(rest) = src.strip_prefix("ldb:") {
        let _ = rest;
        return Err(kind_err(Kind::Syntax, "the ldb: scheme is not supported"));
    }

    let (db_part, tail_part) = match src.split_once("::") {
        Some((db, tail)) => (db, Some(tail)),
        None => (src, None),
    };

    let db = parse_db_spec(db_part)?;
    let tail = match tail_part {
        None => None,
        Some(t) => Some(parse_tail(t)?),
    };
    Ok(DatasetSpec { db, tail })
}

fn parse_db_spec(s: &str) -> Result<DbSpec> {
    if s == "mem" {
        return Ok(DbSpec::Mem);
    }
    if s.starts_with("http://") || s.starts_with("https://") {
        return Ok(DbSpec::Http(s.to_string()));
    }
    Err(kind_err(Kind::Syntax, format!("invalid database spec: {s}")))
}

fn parse_tail(s: &str) -> Result<Tail> {
    if let Some(hex) = s.strip_prefix('#') {
        return hex.parse::<Hash>().map(Tail::Hash).map_err(|_| kind_err(Kind::Syntax, format!("Invalid hash: {hex}")));
    }
    if s.starts_with('.') || s.starts_with('[') || s.starts_with('@') {
        return parse_path(s).map(Tail::Path);
    }
    if !s.is_empty() && s.chars().all(is_dataset_name_char) {
        return Ok(Tail::Dataset(s.to_string()));
    }
    Err(kind_err(Kind::Syntax, format!("invalid dataset spec tail: {s}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn bare_mem_is_the_in_memory_db() {
        assert_eq!(parse_dataset_spec("mem").unwrap(), DatasetSpec { db: DbSpec::Mem, tail: None });
    }

    #[test]
    fn mem_with_dataset_name() {
        let spec = parse_dataset_spec("mem::ds1").unwrap();
        assert_eq!(spec.db, DbSpec::Mem);
        assert_eq!(spec.tail, Some(Tail::Dataset("ds1".to_string())));
    }

    #[test]
    fn http_db_spec_parses() {
        let spec = parse_dataset_spec("http://example.com/db::ds1").unwrap();
        assert_eq!(spec.db, DbSpec::Http("http://example.com/db".to_string()));
    }

    #[test]
    fn ldb_scheme_is_rejected() {
        assert!(parse_dataset_spec("ldb:foo").is_err());
    }

    #[test]
    fn mem_colon_is_not_a_bare_mem() {
        assert!(parse_db_spec("mem:").is_err());
    }

    #[test]
    fn hash_tail_parses() {
        let h = Hash::of_bytes(b"x");
        let spec = parse_dataset_spec(&format!("mem::#{h}")).unwrap();
        assert_eq!(spec.tail, Some(Tail::Hash(h)));
    }
}
