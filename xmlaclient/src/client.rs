//! Client XML/A : session, opérations Discover et Execute.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, trace, warn};
use xmlasoap::{SoapEnvelope, XmlaMethod, build_discover_request, build_execute_request};

use crate::cellset::{Cellset, CellsetBuilder};
use crate::dialect::{Dialect, DialectResolver, ResponseKind, locate_root};
use crate::discover::{
    MetadataCollector, MetadataKind, MetadataRow, PropertyMapCollector, RowHandler, TreeOp,
    request_types, walk_discover,
};
use crate::drillthrough::{DrillthroughReceiver, DrillthroughResult, walk_drillthrough};
use crate::endpoint::Endpoint;
use crate::errors::{Operation, Result, XmlaError, check_fault};
use crate::execute::{CellsetHandler, walk_execute};
use crate::soap_client::{HttpTransport, Transport};

/// Client d'un serveur XML/A.
///
/// Le dialecte et la source de données sont figés dès qu'ils sont connus :
/// donnés à la construction, ou découverts au premier appel via
/// `DISCOVER_DATASOURCES`.
#[derive(Debug)]
pub struct XmlaClient<T: Transport = HttpTransport> {
    endpoint: Endpoint,
    transport: T,
    dialect: DialectResolver,
    data_source: OnceLock<String>,
    log_soap_messages: bool,
}

impl XmlaClient<HttpTransport> {
    /// Client HTTP ; dialecte et source de données seront découverts
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_transport(endpoint, HttpTransport::default())
    }
}

impl<T: Transport> XmlaClient<T> {
    pub fn with_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport,
            dialect: DialectResolver::new(),
            data_source: OnceLock::new(),
            log_soap_messages: false,
        }
    }

    /// Fixe la source de données ; le dialecte s'en déduit
    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        let data_source = data_source.into();
        self.dialect = DialectResolver::fixed(Dialect::from_data_source(&data_source));
        self.data_source = OnceLock::from(data_source);
        self
    }

    /// Fixe le dialecte ; la source de données sera découverte
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = DialectResolver::fixed(dialect);
        self
    }

    /// Trace les corps de requête
    pub fn with_soap_logging(mut self, enabled: bool) -> Self {
        self.log_soap_messages = enabled;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.current()
    }

    /// Force la découverte du dialecte et de la source de données
    pub fn connect(&self) -> Result<&str> {
        self.data_source()
    }

    /// Source de données, découverte au besoin
    pub fn data_source(&self) -> Result<&str> {
        if let Some(data_source) = self.data_source.get() {
            return Ok(data_source.as_str());
        }
        let resolved = self.resolve_data_source()?;
        Ok(self.data_source.get_or_init(|| resolved).as_str())
    }

    fn resolve_data_source(&self) -> Result<String> {
        let operation = Operation::discover(request_types::DISCOVER_DATASOURCES);
        // toutes les lignes sont fusionnées : la dernière l'emporte
        let mut collector = PropertyMapCollector::new();
        self.discover(
            request_types::DISCOVER_DATASOURCES,
            Some(&[]),
            &[("Content", "Data")],
            &mut collector,
        )?;
        if collector.row_count() == 0 {
            return Err(XmlaError::protocol(&operation, "No result from Discover Datasource"));
        }

        let columns = collector.into_map();
        let column = |name: &str| {
            columns.get(name).ok_or_else(|| {
                XmlaError::protocol(&operation, format!("Data source row has no {}", name))
            })
        };
        let data_source = match self.dialect() {
            Dialect::Sap => format!(
                "Provider={};Data Source={}",
                column("ProviderName")?,
                column("DataSourceDescription")?
            ),
            _ => column("DataSourceInfo")?.clone(),
        };

        debug!(data_source = %data_source, dialect = %self.dialect(), "XML/A data source resolved");
        Ok(data_source)
    }

    fn round_trip(
        &self,
        operation: &Operation,
        method: XmlaMethod,
        request: &str,
    ) -> Result<SoapEnvelope> {
        debug!(operation = %operation, url = %self.endpoint.url(), "Sending XML/A request");
        if self.log_soap_messages {
            trace!(body = %request, "XML/A request body");
        }

        let envelope = self
            .transport
            .send(&self.endpoint, method, request)
            .map_err(|e| XmlaError::transport(operation, e))?;

        if let Err(err) = check_fault(operation, &envelope) {
            warn!(error = %err, "XML/A server fault");
            return Err(err);
        }
        Ok(envelope)
    }

    /// Discover générique : chaque ligne de la réponse est passée à `handler`.
    ///
    /// `restrictions` à `None` omet le bloc Restrictions de la requête.
    /// Renvoie le nombre de lignes.
    pub fn discover<H>(
        &self,
        request_type: &str,
        restrictions: Option<&[(&str, &str)]>,
        properties: &[(&str, &str)],
        handler: &mut H,
    ) -> Result<usize>
    where
        H: RowHandler + ?Sized,
    {
        let operation = Operation::discover(request_type);
        let request = build_discover_request(request_type, restrictions, properties)
            .map_err(|e| request_error(&operation, e))?;

        let envelope = self.round_trip(&operation, XmlaMethod::Discover, &request)?;
        let body = &envelope.body.content;
        let dialect = self.dialect.resolve(&operation, body)?;
        let root = locate_root(&operation, body, dialect, ResponseKind::Discover)?;

        let rows = walk_discover(root, dialect, handler);
        debug!(request_type, rows, "Discover done");
        Ok(rows)
    }

    fn discover_metadata(
        &self,
        kind: MetadataKind,
        catalog: Option<&str>,
        restrictions: &[(&str, &str)],
    ) -> Result<Vec<MetadataRow>> {
        let data_source = self.data_source()?;
        let mut properties = vec![("DataSourceInfo", data_source), ("Content", "SchemaData")];
        if let Some(catalog) = catalog {
            properties.push(("Catalog", catalog));
        }

        let mut collector = MetadataCollector::new(kind);
        self.discover(
            kind.request_type(),
            Some(restrictions),
            &properties,
            &mut collector,
        )?;
        Ok(collector.into_rows())
    }

    /// Toutes les colonnes de `DISCOVER_DATASOURCES`, fusionnées
    pub fn discover_datasources(&self) -> Result<HashMap<String, String>> {
        let mut collector = PropertyMapCollector::new();
        self.discover(
            request_types::DISCOVER_DATASOURCES,
            Some(&[]),
            &[("Content", "Data")],
            &mut collector,
        )?;
        Ok(collector.into_map())
    }

    pub fn discover_catalogs(&self) -> Result<Vec<MetadataRow>> {
        self.discover_metadata(MetadataKind::Catalog, None, &[])
    }

    pub fn discover_datasource_properties(&self) -> Result<Vec<MetadataRow>> {
        self.discover_metadata(MetadataKind::DataSourceProperty, None, &[])
    }

    pub fn discover_cubes(&self, catalog: &str) -> Result<Vec<MetadataRow>> {
        self.discover_metadata(
            MetadataKind::Cube,
            Some(catalog),
            &[("CATALOG_NAME", catalog)],
        )
    }

    pub fn discover_dimensions(&self, catalog: &str, cube: &str) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, None, None, None);
        self.discover_metadata(MetadataKind::Dimension, Some(catalog), &restrictions)
    }

    pub fn discover_hierarchies(
        &self,
        catalog: &str,
        cube: &str,
        dimension: Option<&str>,
    ) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, dimension, None, None);
        self.discover_metadata(MetadataKind::Hierarchy, Some(catalog), &restrictions)
    }

    pub fn discover_levels(
        &self,
        catalog: &str,
        cube: &str,
        dimension: Option<&str>,
        hierarchy: Option<&str>,
    ) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, dimension, hierarchy, None);
        self.discover_metadata(MetadataKind::Level, Some(catalog), &restrictions)
    }

    pub fn discover_members(
        &self,
        catalog: &str,
        cube: &str,
        dimension: Option<&str>,
        hierarchy: Option<&str>,
        level: Option<&str>,
    ) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, dimension, hierarchy, level);
        self.discover_metadata(MetadataKind::Member, Some(catalog), &restrictions)
    }

    /// Membres liés à `member` selon `tree_op` (enfants, parent, ...)
    pub fn discover_member_tree(
        &self,
        catalog: &str,
        cube: &str,
        member: &str,
        tree_op: TreeOp,
    ) -> Result<Vec<MetadataRow>> {
        let tree_op = tree_op.bits().to_string();
        let restrictions = [
            ("CATALOG_NAME", catalog),
            ("CUBE_NAME", cube),
            ("MEMBER_UNIQUE_NAME", member),
            ("TREE_OP", tree_op.as_str()),
        ];
        self.discover_metadata(MetadataKind::Member, Some(catalog), &restrictions)
    }

    pub fn discover_member_properties(
        &self,
        catalog: &str,
        cube: &str,
        dimension: Option<&str>,
        hierarchy: Option<&str>,
        level: Option<&str>,
    ) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, dimension, hierarchy, level);
        self.discover_metadata(MetadataKind::Property, Some(catalog), &restrictions)
    }

    /// Variables de requête (SAP BW uniquement)
    pub fn discover_sap_variables(&self, catalog: &str, cube: &str) -> Result<Vec<MetadataRow>> {
        let restrictions = cube_scope(catalog, cube, None, None, None);
        self.discover_metadata(MetadataKind::Variable, Some(catalog), &restrictions)
    }

    /// Exécute une requête MDX et pilote `handler` avec le résultat
    pub fn execute<H>(&self, query: &str, catalog: &str, handler: &mut H) -> Result<()>
    where
        H: CellsetHandler + ?Sized,
    {
        let operation = Operation::Execute;
        let data_source = self.data_source()?;
        let properties = [
            ("DataSourceInfo", data_source),
            ("Catalog", catalog),
            ("Format", "Multidimensional"),
            ("AxisFormat", "TupleFormat"),
        ];
        let request = build_execute_request(query, &properties)
            .map_err(|e| request_error(&operation, e))?;

        let envelope = self.round_trip(&operation, XmlaMethod::Execute, &request)?;
        let root = locate_root(
            &operation,
            &envelope.body.content,
            self.dialect(),
            ResponseKind::Multidimensional,
        )?;
        walk_execute(root, handler)
    }

    pub fn execute_cellset(&self, query: &str, catalog: &str) -> Result<Cellset> {
        let mut builder = CellsetBuilder::new();
        self.execute(query, catalog, &mut builder)?;
        Ok(builder.build())
    }

    /// Exécute une requête drillthrough (format tabulaire)
    pub fn execute_drillthrough<R>(&self, query: &str, catalog: &str, receiver: &mut R) -> Result<()>
    where
        R: DrillthroughReceiver + ?Sized,
    {
        let operation = Operation::ExecuteDrillthrough;
        let data_source = self.data_source()?;
        let properties = [
            ("DataSourceInfo", data_source),
            ("Catalog", catalog),
            ("Format", "Tabular"),
        ];
        let request = build_execute_request(query, &properties)
            .map_err(|e| request_error(&operation, e))?;

        let envelope = self.round_trip(&operation, XmlaMethod::Execute, &request)?;
        let root = locate_root(
            &operation,
            &envelope.body.content,
            self.dialect(),
            ResponseKind::Tabular,
        )?;

        let result = walk_drillthrough(root)?;
        debug!(
            columns = result.columns.len(),
            rows = result.rows.len(),
            "Drillthrough done"
        );
        receiver.drill_header(result.columns);
        receiver.drill_rows(result.rows);
        Ok(())
    }

    pub fn execute_drillthrough_table(
        &self,
        query: &str,
        catalog: &str,
    ) -> Result<DrillthroughResult> {
        let mut result = DrillthroughResult::default();
        self.execute_drillthrough(query, catalog, &mut result)?;
        Ok(result)
    }
}

fn request_error(operation: &Operation, err: xmltree::Error) -> XmlaError {
    XmlaError::Request {
        operation: operation.clone(),
        message: err.to_string(),
    }
}

/// Restrictions cube → dimension → hiérarchie → niveau
fn cube_scope<'a>(
    catalog: &'a str,
    cube: &'a str,
    dimension: Option<&'a str>,
    hierarchy: Option<&'a str>,
    level: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut restrictions = vec![("CATALOG_NAME", catalog), ("CUBE_NAME", cube)];
    if let Some(dimension) = dimension {
        restrictions.push(("DIMENSION_UNIQUE_NAME", dimension));
    }
    if let Some(hierarchy) = hierarchy {
        restrictions.push(("HIERARCHY_UNIQUE_NAME", hierarchy));
    }
    if let Some(level) = level {
        restrictions.push(("LEVEL_UNIQUE_NAME", level));
    }
    restrictions
}
