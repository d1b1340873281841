use assert_matches::assert_matches;

use kira_taxon_report::domain::TaxonId;
use kira_taxon_report::error::KiraError;
use kira_taxon_report::ncbi::{
    EntrezHttpClient, EntrezIdentity, History, parse_esearch_json, parse_taxonomy_xml, user_agent,
};

fn client(api_key: Option<&str>) -> EntrezHttpClient {
    EntrezHttpClient::with_base_url(
        EntrezIdentity {
            email: "curator@example.org".parse().unwrap(),
            api_key: api_key.map(str::to_string),
        },
        "http://127.0.0.1:9/eutils/",
    )
    .unwrap()
}

fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

fn history() -> History {
    History {
        web_env: "MCID_6523a9f0c8c54f0c1d2b3c4e".to_string(),
        query_key: "1".to_string(),
    }
}

#[test]
fn esearch_reply_with_history() {
    let body = r#"{
        "header": {"type": "esearch", "version": "0.3"},
        "esearchresult": {
            "count": "1523",
            "retmax": "20",
            "retstart": "0",
            "querykey": "1",
            "webenv": "MCID_6523a9f0c8c54f0c1d2b3c4e",
            "idlist": ["2554823829"]
        }
    }"#;
    let reply = parse_esearch_json(body).unwrap();
    assert_eq!(reply.count, 1523);
    assert_eq!(
        reply.history,
        Some(History {
            web_env: "MCID_6523a9f0c8c54f0c1d2b3c4e".to_string(),
            query_key: "1".to_string(),
        })
    );
}

#[test]
fn esearch_service_errors() {
    let body = r#"{"error": "API key invalid", "api-key": "bogus", "type": "invalid"}"#;
    assert_matches!(
        parse_esearch_json(body),
        Err(KiraError::NcbiService(msg)) if msg == "API key invalid"
    );

    let body = r#"{"esearchresult": {"ERROR": "Invalid query"}}"#;
    assert_matches!(parse_esearch_json(body), Err(KiraError::NcbiService(_)));
}

#[test]
fn esearch_results_without_history_are_malformed() {
    let body = r#"{"esearchresult": {"count": "4"}}"#;
    assert_matches!(parse_esearch_json(body), Err(KiraError::MalformedResponse(_)));
}

#[test]
fn esearch_garbage_is_malformed() {
    assert_matches!(
        parse_esearch_json("<html>Bad Gateway</html>"),
        Err(KiraError::MalformedResponse(_))
    );
}

#[test]
fn taxonomy_reply_scientific_name() {
    let xml = r#"<?xml version="1.0" ?>
<TaxaSet>
<Taxon>
    <TaxId>2697049</TaxId>
    <ScientificName>Severe acute respiratory syndrome coronavirus 2</ScientificName>
    <OtherNames><GenbankCommonName>SARS-CoV-2</GenbankCommonName></OtherNames>
    <Rank>no rank</Rank>
</Taxon>
</TaxaSet>"#;
    assert_eq!(
        parse_taxonomy_xml(xml).unwrap(),
        "Severe acute respiratory syndrome coronavirus 2"
    );
}

#[test]
fn taxonomy_reply_for_unknown_id() {
    let xml = r#"<?xml version="1.0" ?><TaxaSet></TaxaSet>"#;
    assert_matches!(parse_taxonomy_xml(xml), Err(KiraError::MalformedResponse(_)));

    let xml = r#"<eFetchResult>
<ERROR>ID list is empty! Possibly it has no correct IDs.</ERROR>
</eFetchResult>"#;
    assert_matches!(parse_taxonomy_xml(xml), Err(KiraError::NcbiService(_)));
}

#[test]
fn fetch_query_reads_the_stored_search() {
    let params = client(None).fetch_params("nucleotide", &history(), 40, 500);

    assert_eq!(param(&params, "db"), Some("nucleotide"));
    assert_eq!(param(&params, "rettype"), Some("gb"));
    assert_eq!(param(&params, "retmode"), Some("text"));
    assert_eq!(param(&params, "retstart"), Some("40"));
    assert_eq!(param(&params, "retmax"), Some("500"));
    assert_eq!(param(&params, "WebEnv"), Some("MCID_6523a9f0c8c54f0c1d2b3c4e"));
    assert_eq!(param(&params, "query_key"), Some("1"));
}

#[test]
fn search_query_requests_history() {
    let params = client(None).search_params("nucleotide", "txid9606[Organism]");

    assert_eq!(param(&params, "term"), Some("txid9606[Organism]"));
    assert_eq!(param(&params, "usehistory"), Some("y"));
    assert_eq!(param(&params, "retmode"), Some("json"));
}

#[test]
fn every_query_carries_tool_and_email() {
    let client = client(Some("0123abcd"));
    let taxon: TaxonId = "9606".parse().unwrap();
    let queries = [
        client.taxonomy_params(&taxon),
        client.search_params("nucleotide", "txid9606[Organism]"),
        client.fetch_params("nucleotide", &history(), 0, 20),
    ];

    for params in &queries {
        assert_eq!(param(params, "tool"), Some("kira-tr"));
        assert_eq!(param(params, "email"), Some("curator@example.org"));
        assert_eq!(param(params, "api_key"), Some("0123abcd"));
    }
    assert_eq!(param(&queries[0], "db"), Some("taxonomy"));
    assert_eq!(param(&queries[0], "id"), Some("9606"));
}

#[test]
fn blank_api_key_is_not_sent() {
    let params = client(Some("   ")).search_params("nucleotide", "txid9606[Organism]");
    assert_eq!(param(&params, "api_key"), None);

    let params = client(None).search_params("nucleotide", "txid9606[Organism]");
    assert_eq!(param(&params, "api_key"), None);
}

#[test]
fn client_identifies_itself() {
    assert_eq!(user_agent(), format!("kira-tr/{}", env!("CARGO_PKG_VERSION")));
    assert_eq!(client(None).base_url(), "http://127.0.0.1:9/eutils");
}
