use std::collections::BTreeSet;
use std::sync::Arc;

use rmcp::model::Tool;
use tracing::{debug, info};

use crate::introspection::{schema::FullType, snapshot::SchemaSnapshot};

use super::{ArgDescriptor, FieldDescriptor, Operation, OperationKind};

/// The tools derived from one schema snapshot
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    snapshot: Option<Arc<SchemaSnapshot>>,
    operations: Vec<Operation>,
}

impl Catalog {
    /// Build one operation per root Query field, then per root Mutation field, skipping
    /// disabled resolvers by exact field name
    pub fn rebuild(snapshot: Arc<SchemaSnapshot>, disabled_resolvers: &BTreeSet<String>) -> Self {
        let schema = snapshot.schema();
        let roots = [
            (OperationKind::Query, schema.query_root()),
            (OperationKind::Mutation, schema.mutation_root()),
        ];

        let mut operations = Vec::new();
        for (kind, root) in roots {
            let Some(root) = root else {
                continue;
            };
            for descriptor in descriptors(kind, root) {
                if disabled_resolvers.contains(&descriptor.field_name) {
                    debug!("Skipping disabled resolver {}", descriptor.field_name);
                    continue;
                }
                let descriptor = FieldDescriptor {
                    return_type: schema.resolve_enums(descriptor.return_type),
                    args: descriptor
                        .args
                        .into_iter()
                        .map(|arg| ArgDescriptor {
                            type_ref: schema.resolve_enums(arg.type_ref),
                            ..arg
                        })
                        .collect(),
                    ..descriptor
                };
                operations.push(Operation::new(descriptor, snapshot.clone()));
            }
        }

        info!(
            "Built {} tools from the schema: {}",
            operations.len(),
            operations
                .iter()
                .map(|operation| operation.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self {
            snapshot: Some(snapshot),
            operations,
        }
    }

    /// The snapshot the catalog was built from, if any
    pub fn snapshot(&self) -> Option<&Arc<SchemaSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn find(&self, tool_name: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|operation| operation.name() == tool_name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.operations
            .iter()
            .map(|operation| operation.name())
            .collect()
    }

    pub fn tools(&self) -> impl Iterator<Item = Tool> + '_ {
        self.operations
            .iter()
            .map(|operation| operation.as_ref().clone())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn descriptors(kind: OperationKind, root: &FullType) -> impl Iterator<Item = FieldDescriptor> + '_ {
    root.fields().iter().map(move |field| FieldDescriptor {
        field_name: field.name.clone(),
        operation_kind: kind,
        return_type: field.type_ref.clone(),
        args: field
            .args
            .iter()
            .map(|arg| ArgDescriptor {
                name: arg.name.clone(),
                type_ref: arg.type_ref.clone(),
                description: arg.description.clone(),
            })
            .collect(),
        description: field.description.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::schema::TypeRef;
    use crate::operations::test_support::countries_snapshot;
    use rstest::rstest;

    fn disabled(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn lists_queries_then_mutations_in_declaration_order() {
        let catalog = Catalog::rebuild(Arc::new(countries_snapshot()), &BTreeSet::new());

        assert_eq!(
            catalog.tool_names(),
            vec![
                "query_countries",
                "query_country",
                "query_continents",
                "query_continent",
                "query_languages",
                "query_language",
                "query_ping",
                "mutation_rateCountry",
            ]
        );
        assert!(!catalog.is_empty());
        assert!(catalog.snapshot().is_some());
    }

    #[rstest]
    #[case(&[], 8)]
    #[case(&["country"], 7)]
    #[case(&["country", "rateCountry"], 6)]
    #[case(&["Country"], 8)]
    #[case(&["unknown"], 8)]
    fn tool_count_excludes_disabled_resolvers(#[case] names: &[&str], #[case] expected: usize) {
        let snapshot = Arc::new(countries_snapshot());
        let query_fields = snapshot.schema().query_root().unwrap().fields().len();
        let mutation_fields = snapshot.schema().mutation_root().unwrap().fields().len();
        let disabled = disabled(names);
        let skipped = snapshot
            .schema()
            .query_root()
            .unwrap()
            .fields()
            .iter()
            .chain(snapshot.schema().mutation_root().unwrap().fields())
            .filter(|field| disabled.contains(&field.name))
            .count();

        let catalog = Catalog::rebuild(snapshot, &disabled);

        assert_eq!(catalog.len(), query_fields + mutation_fields - skipped);
        assert_eq!(catalog.len(), expected);
    }

    #[test]
    fn disabled_resolver_has_no_tool() {
        let catalog = Catalog::rebuild(Arc::new(countries_snapshot()), &disabled(&["country"]));

        assert!(catalog.find("query_country").is_none());
        assert!(catalog.find("query_countries").is_some());
    }

    #[test]
    fn resolves_enum_arguments() {
        let catalog = Catalog::rebuild(Arc::new(countries_snapshot()), &BTreeSet::new());
        let countries = catalog.find("query_countries").unwrap();
        let sort = countries
            .descriptor()
            .args
            .iter()
            .find(|arg| arg.name == "sort")
            .unwrap();

        assert_eq!(
            sort.type_ref,
            TypeRef::Enum {
                name: "SortOrder".to_string(),
                values: vec!["ASC".to_string(), "DESC".to_string()],
            }
        );
    }

    #[test]
    fn empty_catalog_has_no_tools() {
        let catalog = Catalog::default();

        assert_eq!(catalog.len(), 0);
        assert_eq!(catalog.tools().count(), 0);
        assert!(catalog.snapshot().is_none());
    }
}
