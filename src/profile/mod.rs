//! # Pagination Profiles
//!
//! Every report viewer paginates with the same packer, but the numbers
//! differ: how much fits on a section's first page (which also carries the
//! section header and column headings), how much fits on a continuation
//! page, how many photos an item may show before it is chunked, and how
//! much each kind of block weighs.
//!
//! Those numbers are configuration, tuned against real print output. The
//! built-in values live in [`PaginationProfile::for_kind`]; a JSON profile
//! can override any of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LaudoError, Result};
use crate::model::ReportKind;

/// Capacities and weights for one report type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationProfile {
    /// Capacity of the first page of each section.
    pub first_page_capacity: f64,
    /// Capacity of every page after a section's first.
    pub continuation_capacity: f64,
    /// Capacity taken from the document's very first page by the report
    /// header block (project data, logo, signatures).
    pub document_header_reserve: f64,
    /// Hard cap on blocks per page, regardless of weight headroom.
    pub max_blocks_per_page: Option<usize>,
    /// Items with more photos than this are split into chunks.
    pub max_photos_per_block: usize,
    pub weights: WeightTable,
}

/// Block kind → weight function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightTable {
    pub comment: CommentWeight,
    pub row: RowWeight,
    pub photos_per_row: usize,
    pub photo_row_weight: f64,
}

/// How a comment block is weighed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommentWeight {
    /// The same weight whatever the text length.
    Flat { weight: f64 },
    /// `max(1, ceil(chars / chars_per_line)) / damping`.
    #[serde(rename_all = "camelCase")]
    LineScaled { chars_per_line: usize, damping: f64 },
}

/// How a data row without photos is weighed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RowWeight {
    Flat { weight: f64 },
    /// Stepped by observation length: >300 chars 1.5, >200 1.2,
    /// >100 1.0, otherwise 0.6.
    ObservationScaled,
}

impl Default for CommentWeight {
    fn default() -> Self {
        CommentWeight::Flat { weight: 1.0 }
    }
}

impl Default for RowWeight {
    fn default() -> Self {
        RowWeight::Flat { weight: 1.0 }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            comment: CommentWeight::default(),
            row: RowWeight::default(),
            photos_per_row: 3,
            photo_row_weight: 2.5,
        }
    }
}

impl Default for PaginationProfile {
    fn default() -> Self {
        Self::for_kind(ReportKind::Generic)
    }
}

// Zero divisors are rejected by `PaginationProfile::validate`; an
// unvalidated table treats them as one.
impl WeightTable {
    /// Weight of a section's general comment.
    pub fn comment_weight(&self, text: &str) -> f64 {
        match self.comment {
            CommentWeight::Flat { weight } => weight,
            CommentWeight::LineScaled {
                chars_per_line,
                damping,
            } => {
                let chars = text.chars().count();
                let lines = chars.div_ceil(chars_per_line.max(1)).max(1);
                lines as f64 / damping
            }
        }
    }

    /// Weight of an item row, or of a photo group when `observation` is
    /// empty. Photos dominate: any photo makes the row
    /// `1 + rows * photo_row_weight`.
    pub fn row_weight(&self, observation: &str, photo_count: usize) -> f64 {
        if photo_count > 0 {
            let photo_rows = photo_count.div_ceil(self.photos_per_row.max(1));
            return 1.0 + photo_rows as f64 * self.photo_row_weight;
        }
        match self.row {
            RowWeight::Flat { weight } => weight,
            RowWeight::ObservationScaled => {
                let chars = observation.chars().count();
                if chars > 300 {
                    1.5
                } else if chars > 200 {
                    1.2
                } else if chars > 100 {
                    1.0
                } else {
                    0.6
                }
            }
        }
    }
}

impl PaginationProfile {
    /// Built-in profile for each report viewer.
    pub fn for_kind(kind: ReportKind) -> Self {
        let base = PaginationProfile {
            first_page_capacity: 6.0,
            continuation_capacity: 14.0,
            document_header_reserve: 0.0,
            max_blocks_per_page: None,
            max_photos_per_block: 6,
            weights: WeightTable::default(),
        };
        match kind {
            ReportKind::Cftv | ReportKind::ControleAcesso | ReportKind::Generic => base,
            // One table per item, three tables to a sheet.
            ReportKind::Sprinklers => PaginationProfile {
                first_page_capacity: 4.0,
                continuation_capacity: 4.0,
                max_blocks_per_page: Some(3),
                max_photos_per_block: 4,
                weights: WeightTable {
                    photo_row_weight: 1.0,
                    photos_per_row: 4,
                    ..WeightTable::default()
                },
                ..base
            },
            // Line-based capacities.
            ReportKind::Hidrantes => PaginationProfile {
                first_page_capacity: 24.0,
                continuation_capacity: 45.0,
                weights: WeightTable {
                    comment: CommentWeight::LineScaled {
                        chars_per_line: 120,
                        damping: 2.0,
                    },
                    row: RowWeight::ObservationScaled,
                    ..WeightTable::default()
                },
                ..base
            },
            ReportKind::Sdai => PaginationProfile {
                first_page_capacity: 8.0,
                continuation_capacity: 12.0,
                document_header_reserve: 2.0,
                max_photos_per_block: 4,
                ..base
            },
            ReportKind::ArCondicionado => PaginationProfile {
                weights: WeightTable {
                    row: RowWeight::ObservationScaled,
                    ..WeightTable::default()
                },
                ..base
            },
        }
    }

    /// Parse a complete profile. Missing fields take generic defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: PaginationProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Overlay a partial JSON profile on top of `base`. Objects merge
    /// field by field; anything the JSON leaves out keeps the base value.
    /// Keys the base does not have are an error.
    pub fn merge_json(base: &PaginationProfile, json: &str) -> Result<Self> {
        let Value::Object(overrides) = serde_json::from_str::<Value>(json)? else {
            return Err(LaudoError::InvalidProfile(
                "profile overrides must be a JSON object".to_string(),
            ));
        };
        let Value::Object(mut merged) = serde_json::to_value(base)? else {
            return Err(LaudoError::InvalidProfile(
                "profile did not serialize to an object".to_string(),
            ));
        };
        merge_values(&mut merged, overrides, "")?;
        let profile: PaginationProfile = serde_json::from_value(Value::Object(merged))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject values the packer cannot honour. Weights must be finite and
    /// non-negative or the page count stops being monotonic in them.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LaudoError::InvalidProfile(msg));

        for (name, value) in [
            ("firstPageCapacity", self.first_page_capacity),
            ("continuationCapacity", self.continuation_capacity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{} must be a positive number, got {}", name, value));
            }
        }
        if self.first_page_capacity > self.continuation_capacity {
            return invalid(format!(
                "firstPageCapacity ({}) exceeds continuationCapacity ({})",
                self.first_page_capacity, self.continuation_capacity
            ));
        }
        let reserve = self.document_header_reserve;
        if !reserve.is_finite() || reserve < 0.0 || reserve >= self.first_page_capacity {
            return invalid(format!(
                "documentHeaderReserve must be in [0, firstPageCapacity), got {}",
                reserve
            ));
        }
        if self.max_blocks_per_page == Some(0) {
            return invalid("maxBlocksPerPage must be at least 1".to_string());
        }
        if self.max_photos_per_block == 0 {
            return invalid("maxPhotosPerBlock must be at least 1".to_string());
        }

        let w = &self.weights;
        if w.photos_per_row == 0 {
            return invalid("photosPerRow must be at least 1".to_string());
        }
        if !w.photo_row_weight.is_finite() || w.photo_row_weight < 0.0 {
            return invalid(format!(
                "photoRowWeight must be non-negative, got {}",
                w.photo_row_weight
            ));
        }
        match w.comment {
            CommentWeight::Flat { weight } if !weight.is_finite() || weight < 0.0 => {
                return invalid(format!("comment weight must be non-negative, got {}", weight));
            }
            CommentWeight::LineScaled { chars_per_line, .. } if chars_per_line == 0 => {
                return invalid("charsPerLine must be at least 1".to_string());
            }
            CommentWeight::LineScaled { damping, .. } if !damping.is_finite() || damping <= 0.0 => {
                return invalid(format!("damping must be positive, got {}", damping));
            }
            _ => {}
        }
        if let RowWeight::Flat { weight } = w.row {
            if !weight.is_finite() || weight < 0.0 {
                return invalid(format!("row weight must be non-negative, got {}", weight));
            }
        }
        Ok(())
    }
}

/// Overlay `overrides` on `base`. Every override key must name a field
/// the base already has, so typos and fields of another weight rule are
/// rejected instead of dropped. A tagged weight object whose `type`
/// differs from the base is taken whole.
fn merge_values(base: &mut Map<String, Value>, overrides: Map<String, Value>, path: &str) -> Result<()> {
    for (key, value) in overrides {
        let field = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        let Some(existing) = base.get_mut(&key) else {
            let hint = match base.get("type").and_then(Value::as_str) {
                Some(tag) => format!(
                    " for weight type `{}`; set \"type\" to change the rule",
                    tag
                ),
                None => String::new(),
            };
            return Err(LaudoError::InvalidProfile(format!(
                "unknown field `{}`{}",
                field, hint
            )));
        };
        match (existing, value) {
            (Value::Object(existing_map), Value::Object(value_map)) => {
                let retagged = value_map
                    .get("type")
                    .is_some_and(|tag| existing_map.get("type") != Some(tag));
                if retagged {
                    *existing_map = value_map;
                } else {
                    merge_values(existing_map, value_map, &field)?;
                }
            }
            (slot, value) => *slot = value,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        for kind in ReportKind::ALL {
            let profile = PaginationProfile::for_kind(kind);
            assert!(profile.validate().is_ok(), "{} profile is invalid", kind);
            assert!(profile.first_page_capacity <= profile.continuation_capacity);
        }
    }

    #[test]
    fn photo_rows_dominate_row_weight() {
        let w = WeightTable::default();
        assert_eq!(w.row_weight("", 0), 1.0);
        assert_eq!(w.row_weight("", 1), 3.5);
        assert_eq!(w.row_weight("", 3), 3.5);
        assert_eq!(w.row_weight("", 4), 6.0);
        assert_eq!(w.row_weight(&"x".repeat(400), 6), 6.0);
    }

    #[test]
    fn observation_scaled_thresholds() {
        let w = WeightTable {
            row: RowWeight::ObservationScaled,
            ..WeightTable::default()
        };
        assert_eq!(w.row_weight(&"a".repeat(301), 0), 1.5);
        assert_eq!(w.row_weight(&"a".repeat(300), 0), 1.2);
        assert_eq!(w.row_weight(&"a".repeat(201), 0), 1.2);
        assert_eq!(w.row_weight(&"a".repeat(150), 0), 1.0);
        assert_eq!(w.row_weight(&"a".repeat(100), 0), 0.6);
        assert_eq!(w.row_weight("", 0), 0.6);
    }

    #[test]
    fn line_scaled_comment() {
        let w = WeightTable {
            comment: CommentWeight::LineScaled {
                chars_per_line: 120,
                damping: 2.0,
            },
            ..WeightTable::default()
        };
        assert_eq!(w.comment_weight("short"), 0.5);
        assert_eq!(w.comment_weight(&"a".repeat(240)), 1.0);
        assert_eq!(w.comment_weight(&"a".repeat(241)), 1.5);
        // Multi-byte characters count once.
        assert_eq!(w.comment_weight(&"ç".repeat(120)), 0.5);
    }

    #[test]
    fn rejects_first_page_larger_than_continuation() {
        let profile = PaginationProfile {
            first_page_capacity: 12.0,
            continuation_capacity: 8.0,
            ..PaginationProfile::default()
        };
        assert!(matches!(profile.validate(), Err(LaudoError::InvalidProfile(_))));
    }

    #[test]
    fn rejects_negative_weights() {
        let mut profile = PaginationProfile::default();
        profile.weights.row = RowWeight::Flat { weight: -1.0 };
        assert!(profile.validate().is_err());

        let mut profile = PaginationProfile::default();
        profile.weights.photo_row_weight = f64::NAN;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let profile = PaginationProfile {
            max_photos_per_block: 0,
            ..PaginationProfile::default()
        };
        assert!(profile.validate().is_err());
        let profile = PaginationProfile {
            max_blocks_per_page: Some(0),
            ..PaginationProfile::default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn merge_keeps_unspecified_fields() {
        let base = PaginationProfile::for_kind(ReportKind::Hidrantes);
        let merged = PaginationProfile::merge_json(
            &base,
            r#"{"continuationCapacity": 40, "weights": {"photoRowWeight": 2}}"#,
        )
        .unwrap();
        assert_eq!(merged.continuation_capacity, 40.0);
        assert_eq!(merged.first_page_capacity, 24.0);
        assert_eq!(merged.weights.photo_row_weight, 2.0);
        assert_eq!(merged.weights.row, RowWeight::ObservationScaled);
    }

    #[test]
    fn merge_replaces_weight_variant() {
        let base = PaginationProfile::for_kind(ReportKind::Hidrantes);
        let merged = PaginationProfile::merge_json(
            &base,
            r#"{"weights": {"comment": {"type": "flat", "weight": 1.5}}}"#,
        )
        .unwrap();
        assert_eq!(merged.weights.comment, CommentWeight::Flat { weight: 1.5 });
    }

    #[test]
    fn merge_rejects_invalid_result() {
        let base = PaginationProfile::default();
        let err = PaginationProfile::merge_json(&base, r#"{"firstPageCapacity": 99}"#).unwrap_err();
        assert!(err.to_string().contains("exceeds continuationCapacity"));
        assert!(PaginationProfile::merge_json(&base, "[1, 2]").is_err());
    }

    #[test]
    fn merge_rejects_fields_of_another_weight_rule() {
        let base = PaginationProfile::for_kind(ReportKind::Hidrantes);
        let err = PaginationProfile::merge_json(&base, r#"{"weights": {"row": {"weight": 2.0}}}"#)
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, LaudoError::InvalidProfile(_)));
        assert!(msg.contains("weights.row.weight"), "{}", msg);
        assert!(msg.contains("observationScaled"), "{}", msg);

        let base = PaginationProfile::default();
        let err = PaginationProfile::merge_json(&base, r#"{"weights": {"comment": {"damping": 3}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("weights.comment.damping"));
    }

    #[test]
    fn merge_tweaks_field_of_same_rule() {
        let base = PaginationProfile::for_kind(ReportKind::Hidrantes);
        let merged =
            PaginationProfile::merge_json(&base, r#"{"weights": {"comment": {"damping": 3}}}"#)
                .unwrap();
        assert_eq!(
            merged.weights.comment,
            CommentWeight::LineScaled {
                chars_per_line: 120,
                damping: 3.0
            }
        );

        let merged = PaginationProfile::merge_json(
            &base,
            r#"{"weights": {"row": {"type": "flat", "weight": 2.0}}}"#,
        )
        .unwrap();
        assert_eq!(merged.weights.row, RowWeight::Flat { weight: 2.0 });
    }

    #[test]
    fn merge_rejects_misspelled_field() {
        let base = PaginationProfile::default();
        let err = PaginationProfile::merge_json(&base, r#"{"firstPageCapacty": 4}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid pagination profile: unknown field `firstPageCapacty`"
        );
    }

    #[test]
    fn zero_divisors_do_not_panic() {
        let w = WeightTable {
            comment: CommentWeight::LineScaled {
                chars_per_line: 0,
                damping: 1.0,
            },
            photos_per_row: 0,
            ..WeightTable::default()
        };
        assert_eq!(w.row_weight("", 2), 1.0 + 2.0 * 2.5);
        assert_eq!(w.comment_weight("abc"), 3.0);
    }

    #[test]
    fn from_json_fills_defaults() {
        let profile = PaginationProfile::from_json(r#"{"maxBlocksPerPage": 3}"#).unwrap();
        assert_eq!(profile.max_blocks_per_page, Some(3));
        assert_eq!(profile.first_page_capacity, 6.0);
    }
}
