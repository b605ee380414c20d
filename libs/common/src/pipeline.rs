//! Aggregation pipeline construction
//!
//! The read side of the application answers every non-trivial query with a
//! MongoDB aggregation pipeline. This module provides the pieces those
//! pipelines are built from: pure stage builders in [`stage`], the
//! [`SortSpec`] parameter mapping, a fluent [`PipelineBuilder`] producing an
//! immutable stage sequence, and the [`ListingPipeline`] composer that
//! assembles filter/sort/display stages in a fixed, auditable order.

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};

/// Default sort key applied when the caller supplies no explicit sort.
pub const DEFAULT_SORT_KEY: &str = "created_at";

/// Sort direction for a pipeline sort stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Map a request parameter to a direction.
    ///
    /// The literal `"asc"` is ascending; any other supplied value is
    /// descending.
    pub fn from_param(param: &str) -> Self {
        if param == "asc" {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    /// The numeric direction understood by a `$sort` stage
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// A fully resolved sort: key plus direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Resolve an explicit sort from request parameters.
    ///
    /// Both the key and the direction must be present; otherwise the caller
    /// falls back to [`SortSpec::newest_first`].
    pub fn from_params(sort_by: Option<&str>, sort_type: Option<&str>) -> Option<Self> {
        match (sort_by, sort_type) {
            (Some(key), Some(direction)) if !key.trim().is_empty() => {
                Some(Self::new(key, SortDirection::from_param(direction)))
            }
            _ => None,
        }
    }

    /// The default sort: newest first by creation time
    pub fn newest_first() -> Self {
        Self::new(DEFAULT_SORT_KEY, SortDirection::Descending)
    }
}

/// Pure builders, one per aggregation stage.
///
/// Each function returns exactly one declarative stage document and has no
/// other effect, so composed sequences can be asserted in tests without a
/// running database.
pub mod stage {
    use super::*;

    /// `$match` on the given predicate
    pub fn match_stage(predicate: Document) -> Document {
        doc! { "$match": predicate }
    }

    /// Left-outer `$lookup` producing an array field
    pub fn lookup(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Document {
        doc! {
            "$lookup": {
                "from": from,
                "localField": local_field,
                "foreignField": foreign_field,
                "as": as_field,
            }
        }
    }

    /// `$lookup` whose joined documents are themselves run through a nested
    /// pipeline before being attached
    pub fn lookup_pipeline(
        from: &str,
        local_field: &str,
        foreign_field: &str,
        as_field: &str,
        pipeline: Vec<Document>,
    ) -> Document {
        doc! {
            "$lookup": {
                "from": from,
                "localField": local_field,
                "foreignField": foreign_field,
                "as": as_field,
                "pipeline": pipeline,
            }
        }
    }

    /// `$addFields` deriving computed fields
    pub fn add_fields(fields: Document) -> Document {
        doc! { "$addFields": fields }
    }

    /// `$project` to the given field specification
    pub fn project(spec: Document) -> Document {
        doc! { "$project": spec }
    }

    /// `$sort` by the spec's key, with `_id` ascending appended as a
    /// deterministic tie-break for equal key values
    pub fn sort(spec: &SortSpec) -> Document {
        let mut keys = Document::new();
        keys.insert(spec.key.as_str(), spec.direction.as_i32());
        if spec.key != "_id" {
            keys.insert("_id", 1);
        }
        doc! { "$sort": keys }
    }

    /// `$unwind` flattening a singleton array field into a plain field.
    ///
    /// Documents whose array is empty are dropped; callers rely on this to
    /// eliminate rows whose joined owner no longer exists.
    pub fn unwind(field: &str) -> Document {
        doc! { "$unwind": format!("${field}") }
    }

    /// `$skip` the first `n` documents
    pub fn skip(n: u64) -> Document {
        doc! { "$skip": n as i64 }
    }

    /// `$limit` the output to `n` documents
    pub fn limit(n: i64) -> Document {
        doc! { "$limit": n }
    }

    /// `$count` into the given output field
    pub fn count(field: &str) -> Document {
        doc! { "$count": field }
    }

    /// `$group` with the given key expression and accumulator fields
    pub fn group(id: impl Into<Bson>, fields: Document) -> Document {
        let id: Bson = id.into();
        let mut spec = doc! { "_id": id };
        spec.extend(fields);
        doc! { "$group": spec }
    }

    /// Case-insensitive text filter over the given fields.
    ///
    /// The query string is escaped before being embedded so user input is
    /// matched literally.
    pub fn text_filter(fields: &[&str], query: &str) -> Document {
        let clauses: Vec<Document> = fields
            .iter()
            .map(|field| {
                doc! { *field: { "$regex": regex::escape(query), "$options": "i" } }
            })
            .collect();
        doc! { "$or": clauses }
    }

    /// Computed expression: number of elements in an array field
    pub fn size_of(field: &str) -> Bson {
        Bson::from(doc! { "$size": format!("${field}") })
    }

    /// Computed expression: whether `value` is present in an array field
    pub fn in_array(value: impl Into<Bson>, field: &str) -> Bson {
        let value: Bson = value.into();
        Bson::from(doc! {
            "$cond": {
                "if": { "$in": [value, format!("${field}")] },
                "then": true,
                "else": false,
            }
        })
    }

    /// Computed expression: first element of an array field
    pub fn first_of(field: &str) -> Bson {
        Bson::from(doc! { "$first": format!("${field}") })
    }

    /// Computed expression: last element of an array field
    pub fn last_of(field: &str) -> Bson {
        Bson::from(doc! { "$last": format!("${field}") })
    }

    /// Computed expression: sum over a numeric array field
    pub fn sum_of(field: &str) -> Bson {
        Bson::from(doc! { "$sum": format!("${field}") })
    }
}

/// Fluent assembly of an ordered, immutable stage sequence
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Document>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one stage
    pub fn stage(mut self, stage: Document) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a stage only when present; absent parameters emit nothing
    pub fn maybe(self, stage: Option<Document>) -> Self {
        match stage {
            Some(stage) => self.stage(stage),
            None => self,
        }
    }

    /// Append a sequence of stages in order
    pub fn stages(mut self, stages: impl IntoIterator<Item = Document>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Finish, yielding the stage sequence
    pub fn build(self) -> Vec<Document> {
        self.stages
    }
}

/// Composer for listing queries.
///
/// Assembles stages in a fixed precedence regardless of the order setters
/// are called in: text filter, owner filter, mandatory invariant filter,
/// sort (explicit or newest-first default), then the display stages (joins,
/// unwind, projection) in the order they were appended. Stages whose
/// triggering parameter is absent are omitted entirely — a no-op `$match`
/// is never emitted.
#[derive(Debug, Clone, Default)]
pub struct ListingPipeline {
    text: Option<Document>,
    owner: Option<Document>,
    invariant: Option<Document>,
    sort: Option<SortSpec>,
    display: Vec<Document>,
}

impl ListingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by a text query over the given fields; blank queries are
    /// ignored
    pub fn text_search(mut self, fields: &[&str], query: Option<&str>) -> Self {
        if let Some(query) = query {
            let query = query.trim();
            if !query.is_empty() {
                self.text = Some(stage::match_stage(stage::text_filter(fields, query)));
            }
        }
        self
    }

    /// Filter by an owner/foreign-key reference when one is supplied
    pub fn owned_by(mut self, field: &str, owner: Option<ObjectId>) -> Self {
        if let Some(owner) = owner {
            self.owner = Some(stage::match_stage(doc! { field: owner }));
        }
        self
    }

    /// Mandatory domain invariant filter (e.g. only published documents)
    pub fn require(mut self, invariant: Document) -> Self {
        self.invariant = Some(stage::match_stage(invariant));
        self
    }

    /// Explicit sort; `None` falls back to newest-first
    pub fn sort(mut self, spec: Option<SortSpec>) -> Self {
        self.sort = spec;
        self
    }

    /// Append a display stage (join, unwind, projection) run after
    /// filtering and sorting
    pub fn display_stage(mut self, stage: Document) -> Self {
        self.display.push(stage);
        self
    }

    /// Produce the composed stage sequence
    pub fn compose(self) -> Vec<Document> {
        let sort_spec = self.sort.unwrap_or_else(SortSpec::newest_first);

        PipelineBuilder::new()
            .maybe(self.text)
            .maybe(self.owner)
            .maybe(self.invariant)
            .stage(stage::sort(&sort_spec))
            .stages(self.display)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_maps_asc_literal_only() {
        assert_eq!(SortDirection::from_param("asc"), SortDirection::Ascending);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::from_param("ASC"), SortDirection::Descending);
        assert_eq!(SortDirection::from_param("1"), SortDirection::Descending);
    }

    #[test]
    fn sort_spec_requires_both_params() {
        assert!(SortSpec::from_params(Some("views"), None).is_none());
        assert!(SortSpec::from_params(None, Some("asc")).is_none());
        assert!(SortSpec::from_params(None, None).is_none());

        let spec = SortSpec::from_params(Some("views"), Some("asc")).unwrap();
        assert_eq!(spec.key, "views");
        assert_eq!(spec.direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_stage_appends_id_tie_break() {
        let spec = SortSpec::new("views", SortDirection::Descending);
        assert_eq!(
            stage::sort(&spec),
            doc! { "$sort": { "views": -1, "_id": 1 } }
        );

        // Sorting by _id itself must not duplicate the key.
        let by_id = SortSpec::new("_id", SortDirection::Ascending);
        assert_eq!(stage::sort(&by_id), doc! { "$sort": { "_id": 1 } });
    }

    #[test]
    fn lookup_stage_shape() {
        assert_eq!(
            stage::lookup("users", "owner", "_id", "owner_details"),
            doc! {
                "$lookup": {
                    "from": "users",
                    "localField": "owner",
                    "foreignField": "_id",
                    "as": "owner_details",
                }
            }
        );
    }

    #[test]
    fn group_stage_merges_key_and_accumulators() {
        assert_eq!(
            stage::group(
                Bson::Null,
                doc! { "totalViews": { "$sum": "$views" }, "totalVideos": { "$sum": 1 } }
            ),
            doc! {
                "$group": {
                    "_id": null,
                    "totalViews": { "$sum": "$views" },
                    "totalVideos": { "$sum": 1 },
                }
            }
        );
    }

    #[test]
    fn unwind_stage_references_field_path() {
        assert_eq!(
            stage::unwind("owner_details"),
            doc! { "$unwind": "$owner_details" }
        );
    }

    #[test]
    fn text_filter_escapes_user_input() {
        let filter = stage::text_filter(&["title"], "c++ (tutorial)");
        let clauses = filter.get_array("$or").unwrap();
        let regex = clauses[0]
            .as_document()
            .unwrap()
            .get_document("title")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(regex, regex::escape("c++ (tutorial)"));
    }

    #[test]
    fn in_array_produces_conditional_boolean() {
        let id = ObjectId::new();
        assert_eq!(
            stage::in_array(id, "subscribers.subscriber"),
            Bson::from(doc! {
                "$cond": {
                    "if": { "$in": [id, "$subscribers.subscriber"] },
                    "then": true,
                    "else": false,
                }
            })
        );
    }

    #[test]
    fn builder_preserves_stage_order() {
        let pipeline = PipelineBuilder::new()
            .stage(stage::match_stage(doc! { "published": true }))
            .maybe(None)
            .stage(stage::limit(5))
            .build();

        assert_eq!(
            pipeline,
            vec![
                doc! { "$match": { "published": true } },
                doc! { "$limit": 5_i64 },
            ]
        );
    }

    #[test]
    fn composer_honors_fixed_precedence() {
        let owner = ObjectId::new();
        let pipeline = ListingPipeline::new()
            // Setter order deliberately scrambled; output order must not be.
            .sort(SortSpec::from_params(Some("views"), Some("asc")))
            .require(doc! { "published": true })
            .owned_by("owner", Some(owner))
            .text_search(&["title", "description"], Some("rust"))
            .display_stage(stage::lookup("users", "owner", "_id", "owner_details"))
            .display_stage(stage::unwind("owner_details"))
            .compose();

        assert_eq!(pipeline.len(), 6);
        assert!(pipeline[0].contains_key("$match")); // text
        assert_eq!(
            pipeline[1],
            doc! { "$match": { "owner": owner } }
        );
        assert_eq!(pipeline[2], doc! { "$match": { "published": true } });
        assert_eq!(pipeline[3], doc! { "$sort": { "views": 1, "_id": 1 } });
        assert!(pipeline[4].contains_key("$lookup"));
        assert_eq!(pipeline[5], doc! { "$unwind": "$owner_details" });
    }

    #[test]
    fn composer_omits_absent_stages() {
        let pipeline = ListingPipeline::new()
            .text_search(&["title"], None)
            .owned_by("owner", None)
            .require(doc! { "published": true })
            .compose();

        assert_eq!(
            pipeline,
            vec![
                doc! { "$match": { "published": true } },
                doc! { "$sort": { "created_at": -1, "_id": 1 } },
            ]
        );
    }

    #[test]
    fn composer_ignores_blank_query() {
        let pipeline = ListingPipeline::new()
            .text_search(&["title"], Some("   "))
            .require(doc! { "published": true })
            .compose();

        // A blank query must not become a no-op match stage.
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0], doc! { "$match": { "published": true } });
    }

    #[test]
    fn composer_defaults_to_newest_first() {
        let pipeline = ListingPipeline::new().compose();
        assert_eq!(
            pipeline,
            vec![doc! { "$sort": { "created_at": -1, "_id": 1 } }]
        );
    }
}
