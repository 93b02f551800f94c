//! End-to-end translation, search and count tests over the variant schema.

mod common;

use serde_json::{Value, json};

use common::*;
use vista_compiler::acl::{Acl, Role};
use vista_compiler::pagination::Pagination;
use vista_compiler::statement::{
    Comparator, Filter, FilterType, Group, Instruction, Operand, Operator, Query, Statement,
    SubqueryRef, denormalize, parse_statement,
};
use vista_compiler::{CompileError, CompileRequest, QueryKind, SchemaError, StatementError};

// ============================================================================
// Translation
// ============================================================================

#[test]
fn test_single_generic_filter_exact_output() {
    let statement = json!([{
        "key": "q1",
        "instructions": [wire_filter("gene", json!(["BRCA1"]))]
    }]);

    let out = compiler().translate_value(&statement, "q1").unwrap();

    assert_eq!(
        out,
        json!({ "query": { "bool": { "filter": [
            { "bool": { "must": [{ "term": { "donors.gene_symbol": "BRCA1" } }] } }
        ] } } })
    );
    assert_eq!(
        serde_json::to_string(&out).unwrap(),
        r#"{"query":{"bool":{"filter":[{"bool":{"must":[{"term":{"donors.gene_symbol":"BRCA1"}}]}}]}}}"#
    );
}

#[test]
fn test_absent_key_is_empty_translation() {
    let compiler = compiler();
    let statements = [
        Statement::default(),
        Statement::new(vec![Query::new(
            "q1",
            Group::single(Filter::new(FilterType::Generic, "gene").with_value("BRCA1")),
        )]),
        // a broken query elsewhere does not matter
        Statement::new(vec![
            Query::new(
                "q1",
                Group::new(
                    Operator::And,
                    vec![Instruction::Subquery(SubqueryRef {
                        key: "q1".to_string(),
                    })],
                ),
            ),
            Query::new(
                "q2",
                Group::single(Filter::new(FilterType::Generic, "nope").with_value("x")),
            ),
        ]),
    ];

    for statement in &statements {
        assert_eq!(
            compiler.translate(statement, "missing").unwrap(),
            json!({ "query": { "bool": {} } })
        );
    }
}

#[test]
fn test_generic_all_two_values() {
    let statement = Statement::new(vec![Query::new(
        "q1",
        Group::new(Operator::And, vec![generic("gene", &["BRCA1", "BRCA2"])]),
    )]);

    let out = compiler().translate(&statement, "q1").unwrap();
    let tree = &filter_clauses(&out)[0]["bool"];
    let inner = tree["must"][0]["bool"]["must"].as_array().unwrap();

    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0], json!({ "term": { "donors.gene_symbol": "BRCA1" } }));
    assert_eq!(inner[1], json!({ "term": { "donors.gene_symbol": "BRCA2" } }));
}

#[test]
fn test_numeric_comparison_single_range() {
    let statement = json!([{
        "key": "q1",
        "instructions": [{
            "type": "filter",
            "data": {
                "id": "phylop",
                "type": "numcomparison",
                "values": [
                    { "comparator": ">=", "value": 0 },
                    { "comparator": "<", "value": 10 }
                ]
            }
        }]
    }]);

    let out = compiler().translate_value(&statement, "q1").unwrap();
    assert_eq!(
        filter_clauses(&out)[0],
        json!({ "bool": { "must": [{ "range": { "phylop": { "gte": 0, "lt": 10 } } }] } })
    );
}

#[test]
fn test_generic_boolean_is_or_with_minimum() {
    let statement = Statement::new(vec![Query::new(
        "q1",
        Group::single(
            Filter::new(FilterType::GenericBoolean, "db")
                .with_value("dbsnp")
                .with_value("clinvar"),
        ),
    )]);

    let out = compiler().translate(&statement, "q1").unwrap();
    assert_eq!(
        filter_clauses(&out)[0],
        json!({ "bool": {
            "should": [
                { "term": { "bdExt.dbsnp": true } },
                { "term": { "bdExt.clinvar": true } }
            ],
            "minimum_should_match": 1
        } })
    );
}

#[test]
fn test_composite_never_mixes_range_and_terms() {
    let statement = Statement::new(vec![Query::new(
        "q1",
        Group::single(
            Filter::new(FilterType::Composite, "cadd")
                .with_value(15)
                .with_comparison(Comparator::Gt, 20),
        ),
    )]);

    let out = compiler().translate(&statement, "q1").unwrap();
    let tree = &filter_clauses(&out)[0]["bool"];
    assert_eq!(
        tree["must"],
        json!([{ "range": { "scores.cadd": { "gt": 20 } } }])
    );
    assert!(!out.to_string().contains("\"term\""));
}

#[test]
fn test_nested_filter_keeps_placeholder_until_assembly() {
    let statement = Statement::new(vec![Query::new(
        "q1",
        Group::single(
            Filter::new(FilterType::Generic, "zygosity")
                .with_operand(Operand::None)
                .with_value("HOM"),
        ),
    )]);

    let compiler = compiler();
    let translation = compiler.translate(&statement, "q1").unwrap();
    let nested = &filter_clauses(&translation)[0]["bool"]["must"][0]["nested"];
    assert_eq!(nested["path"], "donors");
    assert_eq!(
        nested["query"]["bool"]["filter"],
        json!([{ "term": { "donors.patient_id": "%%identity%%" } }])
    );
    assert_eq!(
        nested["query"]["bool"]["must_not"],
        json!([{ "term": { "donors.zygosity": "HOM" } }])
    );

    let acl = user_acl();
    let search = compiler
        .search(&statement, &CompileRequest::new("q1", &acl, PATIENT))
        .unwrap();
    assert_no_placeholder(&search.body);
    let scoped = "/query/bool/filter/0/bool/must/0/nested/query/bool/filter/0/term/donors.patient_id";
    assert_eq!(search.body.pointer(scoped), Some(&json!(PATIENT)));
}

#[test]
fn test_or_of_groups() {
    let statement = json!([{
        "key": "q1",
        "instructions": [
            [wire_filter("gene", json!(["BRCA1"])), wire_operator("and"), wire_filter("impact", json!(["HIGH"]))],
            wire_operator("or"),
            wire_filter("chr", json!(["17"]))
        ]
    }]);

    let out = compiler().translate_value(&statement, "q1").unwrap();
    let tree = &filter_clauses(&out)[0]["bool"];

    assert_eq!(tree["minimum_should_match"], 1);
    let should = tree["should"].as_array().unwrap();
    assert_eq!(should.len(), 2);
    assert_eq!(should[0]["bool"]["must"].as_array().unwrap().len(), 2);
    assert_eq!(
        should[1],
        json!({ "bool": { "must": [{ "term": { "chrom": "17" } }] } })
    );
}

#[test]
fn test_subquery_is_expanded() {
    let statement = json!([
        { "key": "q1", "instructions": [wire_filter("gene", json!(["BRCA1"]))] },
        { "key": "q2", "instructions": [wire_subquery("q1"), wire_operator("and not"), wire_filter("chr", json!(["X"]))] }
    ]);

    let out = compiler().translate_value(&statement, "q2").unwrap();
    assert_eq!(
        filter_clauses(&out)[0],
        json!({ "bool": { "must_not": [
            { "bool": { "must": [{ "term": { "donors.gene_symbol": "BRCA1" } }] } },
            { "bool": { "must": [{ "term": { "chrom": "X" } }] } }
        ] } })
    );
}

#[test]
fn test_lone_subquery_without_operator_is_empty() {
    let statement = json!([
        { "key": "q1", "instructions": [wire_filter("gene", json!(["BRCA1"]))] },
        { "key": "q2", "instructions": [wire_subquery("q1")] }
    ]);

    let out = compiler().translate_value(&statement, "q2").unwrap();
    assert_eq!(out, json!({ "query": { "bool": {} } }));
}

#[test]
fn test_cyclic_subquery_is_an_error() {
    let statement = json!([
        { "key": "q1", "instructions": [wire_subquery("q2"), wire_operator("and"), wire_filter("gene", json!(["A"]))] },
        { "key": "q2", "instructions": [wire_subquery("q1"), wire_operator("or"), wire_filter("gene", json!(["B"]))] }
    ]);

    let err = compiler().translate_value(&statement, "q1").unwrap_err();
    match err {
        CompileError::Statement(StatementError::CyclicReference { chain }) => {
            assert_eq!(chain, vec!["q1", "q2", "q1"]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn test_unknown_filter_is_an_error() {
    let statement = json!([{ "key": "q1", "instructions": [wire_filter("polyphen", json!(["D"]))] }]);

    let err = compiler().translate_value(&statement, "q1").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Schema(SchemaError::UnknownFilter { ref id, ref version })
            if id == "polyphen" && version == "2024.1"
    ));
}

#[test]
fn test_invalid_instruction_reports_path() {
    let statement = json!([{
        "key": "q1",
        "instructions": [wire_filter("gene", json!(["A"])), { "type": "operator", "data": { "type": "xor" } }]
    }]);

    let err = compiler().translate_value(&statement, "q1").unwrap_err();
    match err {
        CompileError::Statement(StatementError::InvalidInstruction { path, .. }) => {
            assert_eq!(path, "$[0].instructions[1].data.type");
        }
        other => panic!("expected an invalid instruction, got {other:?}"),
    }
}

#[test]
fn test_denormalize_is_idempotent() {
    let raw = json!([
        { "key": "q1", "instructions": [wire_filter("gene", json!(["BRCA1"]))] },
        { "key": "q2", "instructions": [wire_subquery("q1"), wire_operator("or"), wire_filter("chr", json!(["1"]))] }
    ]);
    let statement = parse_statement(&raw).unwrap();

    let once = denormalize(&statement).unwrap();
    let twice = denormalize(&once).unwrap();
    assert_eq!(once, twice);
}

// ============================================================================
// Search and count documents
// ============================================================================

fn gene_statement() -> Statement {
    Statement::new(vec![Query::new(
        "q1",
        Group::single(Filter::new(FilterType::Generic, "gene").with_value("BRCA1")),
    )])
}

#[test]
fn test_search_document() {
    let acl = user_acl();
    let request = CompileRequest::new("q1", &acl, PATIENT)
        .with_pagination(Pagination::new(Some(3), Some(20)));

    let query = compiler().search(&gene_statement(), &request).unwrap();

    assert_eq!(query.index, "mutations");
    assert_eq!(query.kind, QueryKind::Search);
    assert_eq!(
        query.body,
        json!({
            "from": 40,
            "size": 20,
            "query": { "bool": { "filter": [
                { "bool": { "must": [{ "term": { "donors.gene_symbol": "BRCA1" } }] } },
                { "term": { "donors.practitioner_id": "PR000001" } },
                { "term": { "donors.patient_id": PATIENT } }
            ] } },
            "sort": [{ "impact_score": { "order": "desc" } }]
        })
    );
}

#[test]
fn test_search_scoping_survives_empty_translation() {
    let acl = group_acl();
    let request = CompileRequest::new("absent", &acl, PATIENT);

    let query = compiler().search(&gene_statement(), &request).unwrap();
    assert_eq!(
        filter_clauses(&query.body),
        &vec![
            json!({ "term": { "donors.organization_id": "OR000001" } }),
            json!({ "term": { "donors.patient_id": PATIENT } }),
        ]
    );
}

#[test]
fn test_unrecognized_role_is_unscoped() {
    let acl = Acl::new(Role::from("auditor".to_string()), "PR000001", "OR000001");
    let request = CompileRequest::new("q1", &acl, PATIENT);

    let query = compiler().count(&gene_statement(), &request).unwrap();
    assert_eq!(filter_clauses(&query.body).len(), 2);
}

#[test]
fn test_sort_groups() {
    let acl = user_acl();
    let compiler = compiler();

    let quality = CompileRequest::new("q1", &acl, PATIENT).with_sort_group(Some("quality"));
    let query = compiler.search(&gene_statement(), &quality).unwrap();
    assert_eq!(
        query.body["sort"],
        json!([{ "donors.gq": {
            "order": "desc",
            "nested": { "path": "donors", "filter": { "term": { "donors.patient_id": PATIENT } } }
        } }])
    );

    let relevance = CompileRequest::new("q1", &acl, PATIENT).with_sort_group(Some("relevance"));
    let query = compiler.search(&gene_statement(), &relevance).unwrap();
    assert_eq!(
        query.body["sort"],
        json!([{ "_score": { "order": "desc" } }, { "position": "asc" }])
    );

    let unknown = CompileRequest::new("q1", &acl, PATIENT).with_sort_group(Some("unknown"));
    let query = compiler.search(&gene_statement(), &unknown).unwrap();
    assert_eq!(query.body["sort"], json!([{ "impact_score": { "order": "desc" } }]));
}

#[test]
fn test_count_document() {
    let acl = user_acl();
    let request = CompileRequest::new("q1", &acl, PATIENT);

    let query = compiler().count(&gene_statement(), &request).unwrap();
    assert_eq!(query.kind, QueryKind::Count);
    assert_eq!(query.body.as_object().map(|o| o.len()), Some(1));
    assert_eq!(filter_clauses(&query.body).len(), 3);
    assert_no_placeholder(&query.body);
}

#[test]
fn test_identity_is_escaped_literally() {
    let acl = user_acl();
    let identity = "PA\"7\\x";
    let request = CompileRequest::new("q1", &acl, identity);

    let query = compiler().count(&gene_statement(), &request).unwrap();
    assert_eq!(
        filter_clauses(&query.body)[2],
        json!({ "term": { "donors.patient_id": identity } })
    );
    let _: Value = serde_json::from_str(&query.body.to_string()).unwrap();
}
