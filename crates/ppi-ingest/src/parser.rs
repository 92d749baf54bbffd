//! STRING flat-file parsers
//!
//! Parses the two inputs of a load, fully materialized before any pipeline
//! starts (no streaming contract):
//!
//! - `protein.links.detailed.txt[.gz]`: space-delimited, one header line,
//!   then `protein1 protein2 <seven channel scores> combined_score` per
//!   line. Protein ids carry a numeric taxon prefix ("9606.ENSP...").
//! - peptide mapping TSV: `taxon_id <TAB> ensembl_peptide_id <TAB>
//!   ensembl_gene_id <TAB> comma-separated NCBI gene ids` (the last column
//!   may be empty). Lines starting with `#` are comments.
//!
//! Both readers transparently gunzip `.gz` inputs. Malformed lines are
//! warned about and skipped so one bad row does not abort a load.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use ppi_common::PpiError;

use crate::models::{EvidenceVector, InteractionRecord, EVIDENCE_CHANNELS};
use crate::resolver::{strip_taxon_prefix, PeptideMapping};

/// Read a text input file, gunzipping when the path ends in `.gz`
pub fn read_input(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut content = String::new();
        decoder
            .read_to_string(&mut content)
            .with_context(|| format!("Failed to decompress input file: {}", path.display()))?;
        Ok(content)
    } else {
        String::from_utf8(bytes)
            .with_context(|| format!("Input file is not valid UTF-8: {}", path.display()))
    }
}

/// Parser for STRING detailed-links files
pub struct StringLinksParser {
    /// Maximum number of records to parse (None for unlimited)
    parse_limit: Option<usize>,
}

impl StringLinksParser {
    pub fn new() -> Self {
        Self { parse_limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            parse_limit: Some(limit),
        }
    }

    /// Parse links content into records grouped by taxon id.
    ///
    /// The taxon is taken from the numeric prefix of the first protein id;
    /// lines without one cannot be assigned to an organism and are skipped.
    pub fn parse(&self, content: &str) -> Result<HashMap<u32, Vec<InteractionRecord>>> {
        let mut by_taxon: HashMap<u32, Vec<InteractionRecord>> = HashMap::new();
        let mut total = 0usize;

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // Header line
            if line_num == 0 && line.starts_with("protein1") {
                continue;
            }

            match self.parse_line(line, line_num + 1) {
                Ok((taxon_id, record)) => {
                    by_taxon.entry(taxon_id).or_default().push(record);
                    total += 1;

                    if let Some(limit) = self.parse_limit {
                        if total >= limit {
                            debug!("Reached parse limit of {} records", limit);
                            break;
                        }
                    }
                },
                Err(e) => {
                    warn!("Failed to parse links line {}: {}", line_num + 1, e);
                },
            }
        }

        debug!(
            records = total,
            taxa = by_taxon.len(),
            "Parsed interaction links"
        );
        Ok(by_taxon)
    }

    /// Parse one links line into `(taxon_id, record)`
    pub fn parse_line(&self, line: &str, line_num: usize) -> Result<(u32, InteractionRecord)> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() != EVIDENCE_CHANNELS + 3 {
            return Err(PpiError::Parse(format!(
                "Line {}: expected {} fields, got {}",
                line_num,
                EVIDENCE_CHANNELS + 3,
                fields.len()
            ))
            .into());
        }

        let protein1 = fields[0].to_string();
        let protein2 = fields[1].to_string();

        let taxon_id = taxon_of(&protein1).ok_or_else(|| {
            PpiError::Parse(format!(
                "Line {}: protein id {} has no taxon prefix",
                line_num, protein1
            ))
        })?;

        let mut scores = [0u16; EVIDENCE_CHANNELS];
        for (slot, field) in scores.iter_mut().zip(&fields[2..2 + EVIDENCE_CHANNELS]) {
            *slot = field.parse().map_err(|_| {
                PpiError::Parse(format!("Line {}: invalid channel score: {}", line_num, field))
            })?;
        }

        let combined_score = fields[EVIDENCE_CHANNELS + 2].parse().map_err(|_| {
            PpiError::Parse(format!(
                "Line {}: invalid combined score: {}",
                line_num,
                fields[EVIDENCE_CHANNELS + 2]
            ))
        })?;

        Ok((
            taxon_id,
            InteractionRecord {
                protein1,
                protein2,
                evidence: EvidenceVector::from_channel_scores(scores),
                combined_score,
            },
        ))
    }
}

impl Default for StringLinksParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Taxon id from a prefixed protein id ("9606.ENSP..." -> 9606)
fn taxon_of(protein_id: &str) -> Option<u32> {
    let (prefix, _) = protein_id.split_once('.')?;
    prefix.parse().ok()
}

/// Parser for the peptide-to-gene mapping TSV
pub struct PeptideMappingParser;

impl PeptideMappingParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse mapping content into the resolver's backing map.
    ///
    /// Peptide ids are stored without their taxon prefix so lookups match
    /// both prefixed and bare ids.
    pub fn parse(&self, content: &str) -> Result<HashMap<String, PeptideMapping>> {
        let mut mappings: HashMap<String, PeptideMapping> = HashMap::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if line_num == 0 && line.starts_with("taxon_id") {
                continue;
            }

            match self.parse_line(line, line_num + 1) {
                Ok((peptide_id, mapping)) => {
                    mappings.insert(peptide_id, mapping);
                },
                Err(e) => {
                    warn!("Failed to parse mapping line {}: {}", line_num + 1, e);
                },
            }
        }

        debug!(peptides = mappings.len(), "Parsed peptide mappings");
        Ok(mappings)
    }

    /// Parse one mapping line into `(bare_peptide_id, mapping)`
    pub fn parse_line(&self, line: &str, line_num: usize) -> Result<(String, PeptideMapping)> {
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

        if fields.len() < 4 {
            return Err(PpiError::Parse(format!(
                "Line {}: expected 4 tab-separated fields, got {}",
                line_num,
                fields.len()
            ))
            .into());
        }

        let peptide_id = strip_taxon_prefix(fields[1]).to_string();
        if peptide_id.is_empty() {
            return Err(PpiError::Parse(format!("Line {}: empty peptide id", line_num)).into());
        }

        let ensembl_gene_id = fields[2].to_string();

        let mut ncbi_gene_ids = std::collections::BTreeSet::new();
        for part in fields[3].split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id: i64 = part.parse().map_err(|_| {
                PpiError::Parse(format!("Line {}: invalid NCBI gene id: {}", line_num, part))
            })?;
            ncbi_gene_ids.insert(id);
        }

        Ok((
            peptide_id,
            PeptideMapping {
                ensembl_gene_id,
                ncbi_gene_ids,
            },
        ))
    }
}

impl Default for PeptideMappingParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKS: &str = "\
protein1 protein2 neighborhood fusion cooccurrence coexpression experimental database textmining combined_score
9606.ENSP001 9606.ENSP002 100 0 0 62 77 0 101 490
9606.ENSP002 9606.ENSP003 0 0 0 0 900 0 0 900
10090.ENSMUSP001 10090.ENSMUSP002 0 0 0 0 0 450 0 450";

    #[test]
    fn test_parse_links_grouped_by_taxon() {
        let parser = StringLinksParser::new();
        let by_taxon = parser.parse(LINKS).unwrap();

        assert_eq!(by_taxon.len(), 2);
        assert_eq!(by_taxon[&9606].len(), 2);
        assert_eq!(by_taxon[&10090].len(), 1);

        let first = &by_taxon[&9606][0];
        assert_eq!(first.protein1, "9606.ENSP001");
        assert_eq!(first.combined_score, 490);
        assert_eq!(
            first.evidence.channels(),
            &[true, false, false, true, true, false, true]
        );
    }

    #[test]
    fn test_parse_links_with_limit() {
        let parser = StringLinksParser::with_limit(1);
        let by_taxon = parser.parse(LINKS).unwrap();
        let total: usize = by_taxon.values().map(Vec::len).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_parse_links_skips_malformed_lines() {
        let parser = StringLinksParser::new();
        let content = "9606.ENSP001 9606.ENSP002 not-a-score 0 0 0 0 0 0 490\n\
                       9606.ENSP001 9606.ENSP002 0 0 0 0 0 0 0 490";
        let by_taxon = parser.parse(content).unwrap();
        assert_eq!(by_taxon[&9606].len(), 1);
    }

    #[test]
    fn test_parse_links_line_without_taxon_prefix() {
        let parser = StringLinksParser::new();
        let result = parser.parse_line("ENSP001 ENSP002 0 0 0 0 0 0 0 490", 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_mapping_line() {
        let parser = PeptideMappingParser::new();
        let (peptide, mapping) = parser
            .parse_line("9606\t9606.ENSP001\tENSG001\t100,101", 1)
            .unwrap();

        assert_eq!(peptide, "ENSP001");
        assert_eq!(mapping.ensembl_gene_id, "ENSG001");
        assert_eq!(mapping.ncbi_gene_ids.len(), 2);
    }

    #[test]
    fn test_parse_mapping_empty_gene_list() {
        let parser = PeptideMappingParser::new();
        let (_, mapping) = parser
            .parse_line("9606\tENSP001\tENSG001\t", 1)
            .unwrap();
        assert!(mapping.ncbi_gene_ids.is_empty());
    }

    #[test]
    fn test_parse_mapping_skips_comments_and_header() {
        let parser = PeptideMappingParser::new();
        let content = "taxon_id\tensembl_peptide_id\tensembl_gene_id\tncbi_gene_ids\n\
                       # comment\n\
                       9606\tENSP001\tENSG001\t100";
        let mappings = parser.parse(content).unwrap();
        assert_eq!(mappings.len(), 1);
        assert!(mappings.contains_key("ENSP001"));
    }

    #[test]
    fn test_read_input_plain_and_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("links.txt");
        std::fs::write(&plain, "hello").unwrap();
        assert_eq!(read_input(&plain).unwrap(), "hello");

        let gz = dir.path().join("links.txt.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello").unwrap();
        std::fs::write(&gz, encoder.finish().unwrap()).unwrap();
        assert_eq!(read_input(&gz).unwrap(), "hello");
    }
}
