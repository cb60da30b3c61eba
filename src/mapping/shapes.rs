//! Built-in target shapes.
//!
//! Each shape is a static accessor table. Rule documents address fields of
//! these tables by dotted path, e.g. `identifiers.identifierTypeId` or
//! `broaderTerm.headingRef`.

use super::entity::{EntityShape, FieldDef, ShapeKind};

/// `{ value, identifierTypeId }`
pub static IDENTIFIER: EntityShape = EntityShape {
    name: "identifier",
    kind: ShapeKind::Bibliographic,
    fields: &[FieldDef::text("value"), FieldDef::text("identifierTypeId")],
};

/// Contributor of a bibliographic instance.
pub static CONTRIBUTOR: EntityShape = EntityShape {
    name: "contributor",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("name"),
        FieldDef::text("contributorNameTypeId"),
        FieldDef::text("contributorTypeId"),
        FieldDef::text("contributorTypeText"),
        FieldDef::flag("primary"),
    ],
};

/// Alternative title.
pub static ALTERNATIVE_TITLE: EntityShape = EntityShape {
    name: "alternativeTitle",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("alternativeTitle"),
        FieldDef::text("alternativeTitleTypeId"),
    ],
};

/// Series statement.
pub static SERIES: EntityShape = EntityShape {
    name: "series",
    kind: ShapeKind::Bibliographic,
    fields: &[FieldDef::text("value")],
};

/// Subject heading.
pub static SUBJECT: EntityShape = EntityShape {
    name: "subject",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("value"),
        FieldDef::text("authorityId"),
        FieldDef::text("sourceId"),
        FieldDef::text("typeId"),
    ],
};

/// Classification number.
pub static CLASSIFICATION: EntityShape = EntityShape {
    name: "classification",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("classificationNumber"),
        FieldDef::text("classificationTypeId"),
    ],
};

/// Publication statement.
pub static PUBLICATION: EntityShape = EntityShape {
    name: "publication",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("publisher"),
        FieldDef::text("place"),
        FieldDef::text("dateOfPublication"),
        FieldDef::text("role"),
    ],
};

/// Note on a bibliographic instance.
pub static INSTANCE_NOTE: EntityShape = EntityShape {
    name: "note",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("note"),
        FieldDef::text("instanceNoteTypeId"),
        FieldDef::flag("staffOnly"),
    ],
};

/// Electronic access (URI and link text).
pub static ELECTRONIC_ACCESS: EntityShape = EntityShape {
    name: "electronicAccess",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("uri"),
        FieldDef::text("linkText"),
        FieldDef::text("materialsSpecification"),
        FieldDef::text("publicNote"),
        FieldDef::text("relationshipId"),
    ],
};

/// Bibliographic instance.
pub static INSTANCE: EntityShape = EntityShape {
    name: "instance",
    kind: ShapeKind::Bibliographic,
    fields: &[
        FieldDef::text("hrid"),
        FieldDef::text("source"),
        FieldDef::text("title"),
        FieldDef::text("indexTitle"),
        FieldDef::text("instanceTypeId"),
        FieldDef::text("modeOfIssuanceId"),
        FieldDef::text("catalogedDate"),
        FieldDef::flag("discoverySuppress"),
        FieldDef::int("numberOfPages"),
        FieldDef::texts("editions"),
        FieldDef::texts("languages"),
        FieldDef::texts("physicalDescriptions"),
        FieldDef::texts("publicationFrequency"),
        FieldDef::texts("publicationRange"),
        FieldDef::texts("natureOfContentTermIds"),
        FieldDef::objects("identifiers", &IDENTIFIER),
        FieldDef::objects("contributors", &CONTRIBUTOR),
        FieldDef::objects("alternativeTitles", &ALTERNATIVE_TITLE),
        FieldDef::objects("series", &SERIES),
        FieldDef::objects("subjects", &SUBJECT),
        FieldDef::objects("classifications", &CLASSIFICATION),
        FieldDef::objects("publication", &PUBLICATION),
        FieldDef::objects("notes", &INSTANCE_NOTE),
        FieldDef::objects("electronicAccess", &ELECTRONIC_ACCESS),
    ],
};

/// Call number parts of a holdings record.
pub static CALL_NUMBER: EntityShape = EntityShape {
    name: "callNumber",
    kind: ShapeKind::Holdings,
    fields: &[
        FieldDef::text("prefix"),
        FieldDef::text("callNumber"),
        FieldDef::text("suffix"),
        FieldDef::text("typeId"),
    ],
};

/// Holdings statement (textual holdings).
pub static HOLDINGS_STATEMENT: EntityShape = EntityShape {
    name: "holdingsStatement",
    kind: ShapeKind::Holdings,
    fields: &[
        FieldDef::text("statement"),
        FieldDef::text("note"),
        FieldDef::text("staffNote"),
    ],
};

/// Note on a holdings record.
pub static HOLDINGS_NOTE: EntityShape = EntityShape {
    name: "holdingsNote",
    kind: ShapeKind::Holdings,
    fields: &[
        FieldDef::text("note"),
        FieldDef::text("holdingsNoteTypeId"),
        FieldDef::flag("staffOnly"),
    ],
};

/// Holdings record.
pub static HOLDINGS: EntityShape = EntityShape {
    name: "holdings",
    kind: ShapeKind::Holdings,
    fields: &[
        FieldDef::text("hrid"),
        FieldDef::text("holdingsTypeId"),
        FieldDef::text("permanentLocationId"),
        FieldDef::text("shelvingTitle"),
        FieldDef::text("copyNumber"),
        FieldDef::text("acquisitionMethod"),
        FieldDef::text("receiptStatus"),
        FieldDef::text("retentionPolicy"),
        FieldDef::flag("discoverySuppress"),
        FieldDef::texts("formerIds"),
        FieldDef::object("callNumber", &CALL_NUMBER),
        FieldDef::objects("holdingsStatements", &HOLDINGS_STATEMENT),
        FieldDef::objects("holdingsStatementsForSupplements", &HOLDINGS_STATEMENT),
        FieldDef::objects("holdingsStatementsForIndexes", &HOLDINGS_STATEMENT),
        FieldDef::objects("notes", &HOLDINGS_NOTE),
        FieldDef::objects("electronicAccess", &ELECTRONIC_ACCESS),
    ],
};

/// Cross-reference from one authority heading to another.
pub static RELATED_HEADING: EntityShape = EntityShape {
    name: "relatedHeading",
    kind: ShapeKind::Authority,
    fields: &[FieldDef::text("headingRef"), FieldDef::text("headingType")],
};

/// Note on an authority record.
pub static AUTHORITY_NOTE: EntityShape = EntityShape {
    name: "authorityNote",
    kind: ShapeKind::Authority,
    fields: &[FieldDef::text("note"), FieldDef::text("noteTypeId")],
};

/// Authority record.
///
/// Each heading family has the established form (`personalName`), see-from
/// tracings (`sftPersonalName`), see-also-from tracings (`saftPersonalName`)
/// and their truncated forms (`saftPersonalNameTrunc`).
pub static AUTHORITY: EntityShape = EntityShape {
    name: "authority",
    kind: ShapeKind::Authority,
    fields: &[
        FieldDef::text("naturalId"),
        FieldDef::text("source"),
        FieldDef::text("subjectHeadings"),
        FieldDef::text("personalName"),
        FieldDef::texts("sftPersonalName"),
        FieldDef::texts("saftPersonalName"),
        FieldDef::texts("saftPersonalNameTrunc"),
        FieldDef::text("personalNameTitle"),
        FieldDef::texts("sftPersonalNameTitle"),
        FieldDef::texts("saftPersonalNameTitle"),
        FieldDef::texts("saftPersonalNameTitleTrunc"),
        FieldDef::text("corporateName"),
        FieldDef::texts("sftCorporateName"),
        FieldDef::texts("saftCorporateName"),
        FieldDef::texts("saftCorporateNameTrunc"),
        FieldDef::text("meetingName"),
        FieldDef::texts("sftMeetingName"),
        FieldDef::texts("saftMeetingName"),
        FieldDef::texts("saftMeetingNameTrunc"),
        FieldDef::text("uniformTitle"),
        FieldDef::texts("sftUniformTitle"),
        FieldDef::texts("saftUniformTitle"),
        FieldDef::texts("saftUniformTitleTrunc"),
        FieldDef::text("topicalTerm"),
        FieldDef::texts("sftTopicalTerm"),
        FieldDef::texts("saftTopicalTerm"),
        FieldDef::texts("saftTopicalTermTrunc"),
        FieldDef::text("geographicName"),
        FieldDef::texts("sftGeographicName"),
        FieldDef::texts("saftGeographicName"),
        FieldDef::texts("saftGeographicNameTrunc"),
        FieldDef::text("genreTerm"),
        FieldDef::texts("sftGenreTerm"),
        FieldDef::texts("saftGenreTerm"),
        FieldDef::texts("saftGenreTermTrunc"),
        FieldDef::objects("identifiers", &IDENTIFIER),
        FieldDef::objects("notes", &AUTHORITY_NOTE),
        FieldDef::objects("broaderTerm", &RELATED_HEADING),
        FieldDef::objects("narrowerTerm", &RELATED_HEADING),
        FieldDef::objects("earlierHeading", &RELATED_HEADING),
        FieldDef::objects("laterHeading", &RELATED_HEADING),
    ],
};
