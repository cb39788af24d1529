use serde::Deserialize;

/// Top-level entry of the REST root, grouping databases of one site.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub databases: Vec<DatabaseLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseLink {
    pub href: String,
    pub description: String,
}

impl DatabaseLink {
    /// Sequence definition databases are the only ones carrying schemes
    /// and allele sequences.
    pub fn is_seqdef(&self) -> bool {
        self.description.contains("definitions")
    }
}

/// Links advertised by `GET /db/{db}`. Isolate databases have no
/// `schemes` link of their own on some installations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseAttributes {
    pub schemes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_index() {
        let json = r#"[{"name":"pubmlst","description":"PubMLST","databases":[
            {"href":"https://rest.pubmlst.org/db/pubmlst_test_seqdef","description":"Test sequence/profile definitions","name":"pubmlst_test_seqdef"},
            {"href":"https://rest.pubmlst.org/db/pubmlst_test_isolates","description":"Test isolates","name":"pubmlst_test_isolates"}]}]"#;

        let resources: Vec<Resource> = serde_json::from_str(json).unwrap();
        assert_eq!(resources.len(), 1);
        let dbs = &resources[0].databases;
        assert_eq!(dbs.len(), 2);
        assert!(dbs[0].is_seqdef());
        assert!(!dbs[1].is_seqdef());
    }

    #[test]
    fn test_parse_resource_without_databases() {
        let resources: Vec<Resource> =
            serde_json::from_str(r#"[{"name":"empty","description":"Nothing here"}]"#).unwrap();
        assert!(resources[0].databases.is_empty());
    }

    #[test]
    fn test_parse_attributes_without_schemes() {
        let attrs: DatabaseAttributes =
            serde_json::from_str(r#"{"isolates":"https://rest.pubmlst.org/db/x/isolates"}"#).unwrap();
        assert!(attrs.schemes.is_none());

        let attrs: DatabaseAttributes = serde_json::from_str(
            r#"{"schemes":"https://rest.pubmlst.org/db/x/schemes","loci":"https://rest.pubmlst.org/db/x/loci"}"#,
        )
        .unwrap();
        assert_eq!(attrs.schemes.as_deref(), Some("https://rest.pubmlst.org/db/x/schemes"));
    }
}
