mod common;

use anyhow::Result;
use common::*;
use xmlaclient::discover::RowHandler;
use xmlaclient::{
    CellValue, CellsetHandler, Dialect, MemberRef, Operation, TreeOp, XmlaError,
};
use xmlasoap::XmlaMethod;
use xmltree::Element;

#[test]
fn connect_detects_microsoft_and_reads_datasource_info() -> Result<()> {
    let client = client(&[MS_DATASOURCES]);
    assert_eq!(client.dialect(), Dialect::Unknown);

    assert_eq!(client.connect()?, MONDRIAN_DS);
    assert_eq!(client.dialect(), Dialect::Microsoft);

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    let (method, body) = &requests[0];
    assert_eq!(*method, XmlaMethod::Discover);
    assert!(body.contains("<RequestType>DISCOVER_DATASOURCES</RequestType>"));
    assert!(body.contains("<RestrictionList"));
    assert!(body.contains("<Content>Data</Content>"));

    // data source is cached: no second round trip
    assert_eq!(client.data_source()?, MONDRIAN_DS);
    assert_eq!(client.transport().requests().len(), 1);
    Ok(())
}

#[test]
fn connect_composes_sap_data_source() -> Result<()> {
    let client = client(&[SAP_DATASOURCES]);
    assert_eq!(client.connect()?, "Provider=SAP BW;Data Source=SAP BW Release 7.0");
    assert_eq!(client.dialect(), Dialect::Sap);
    Ok(())
}

#[test]
fn data_source_rows_are_merged_last_wins() -> Result<()> {
    let client = client(&[MS_TWO_DATASOURCES]);
    assert_eq!(
        client.connect()?,
        "Provider=Mondrian;DataSource=SteelWheels;"
    );
    Ok(())
}

#[test]
fn sap_data_source_without_provider_columns_fails() {
    let client = client(&[SAP_DATASOURCES_INCOMPLETE]);
    let err = client.connect().unwrap_err();
    assert!(matches!(err, XmlaError::Protocol { .. }));
    assert_eq!(
        err.operation(),
        Some(&Operation::discover("DISCOVER_DATASOURCES"))
    );
}

#[test]
fn empty_datasource_rowset_fails() {
    let client = client(&[MS_EMPTY_ROWSET]);
    let err = client.connect().unwrap_err();
    assert!(err.to_string().contains("No result from Discover Datasource"));
}

#[test]
fn unrecognized_first_response_is_a_protocol_error() {
    let client = client(&[UNRECOGNIZED]);
    let err = client.connect().unwrap_err();
    assert!(matches!(err, XmlaError::Protocol { .. }));
    assert!(err.to_string().contains("DiscoverResponse"));
    assert_eq!(client.dialect(), Dialect::Unknown);
}

#[test]
fn dialect_does_not_change_once_resolved() -> Result<()> {
    let client = client(&[MS_DATASOURCES, SAP_STYLE_CUBES]);
    client.connect()?;
    assert_eq!(client.dialect(), Dialect::Microsoft);

    let cubes = client.discover_cubes("FoodMart")?;
    assert_eq!(cubes.len(), 2);
    assert_eq!(client.dialect(), Dialect::Microsoft);
    Ok(())
}

#[test]
fn discover_cubes_sends_scope_and_maps_rows() -> Result<()> {
    let client = client(&[SAP_STYLE_CUBES]).with_data_source("Provider=SAP_BW;Data Source=BWP");
    assert_eq!(client.dialect(), Dialect::Sap);

    let cubes = client.discover_cubes("FoodMart")?;
    assert_eq!(cubes[0].name.as_deref(), Some("Sales"));
    assert_eq!(cubes[0].property("CATALOG_NAME"), Some("FoodMart"));
    assert_eq!(cubes[0].property("DESCRIPTION"), Some("FoodMart Schema - Sales Cube"));
    assert_eq!(cubes[1].name.as_deref(), Some("Warehouse"));

    let body = client.transport().last_request();
    assert!(body.contains("<RequestType>MDSCHEMA_CUBES</RequestType>"));
    assert!(body.contains("<CATALOG_NAME>FoodMart</CATALOG_NAME>"));
    assert!(body.contains("<DataSourceInfo>Provider=SAP_BW;Data Source=BWP</DataSourceInfo>"));
    assert!(body.contains("<Content>SchemaData</Content>"));
    assert!(body.contains("<Catalog>FoodMart</Catalog>"));
    Ok(())
}

#[test]
fn member_tree_sends_tree_op_bits() -> Result<()> {
    let client = client(&[MS_MEMBERS]).with_data_source(MONDRIAN_DS);
    let members = client.discover_member_tree(
        "FoodMart",
        "Sales",
        "[Store].[USA]",
        TreeOp::CHILDREN | TreeOp::SELF,
    )?;

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].unique_name.as_deref(), Some("[Store].[USA].[CA]"));
    assert_eq!(members[0].caption.as_deref(), Some("California"));
    assert_eq!(members[0].property("LEVEL_NUMBER"), Some("2"));

    let body = client.transport().last_request();
    assert!(body.contains("<MEMBER_UNIQUE_NAME>[Store].[USA]</MEMBER_UNIQUE_NAME>"));
    assert!(body.contains("<TREE_OP>9</TREE_OP>"));
    Ok(())
}

#[test]
fn generic_discover_without_restrictions_omits_the_block() -> Result<()> {
    let client = client(&[MS_MEMBERS]).with_dialect(Dialect::Microsoft);

    let mut names = Vec::new();
    let mut handler = |row: &Element, _dialect: Dialect| {
        names.push(row.children.len());
    };
    let rows = client.discover("MDSCHEMA_MEMBERS", None, &[("Content", "SchemaData")], &mut handler)?;
    assert_eq!(rows, 1);
    assert_eq!(names.len(), 1);

    let body = client.transport().last_request();
    assert!(!body.contains("Restrictions"));
    assert!(body.contains("<PropertyList>"));
    Ok(())
}

#[test]
fn execute_cellset_assembles_axes_and_cells() -> Result<()> {
    let client = client(&[MS_EXECUTE]).with_data_source(MONDRIAN_DS);
    let query = "SELECT {[Measures].[Unit Sales], [Measures].[Store Cost]} ON COLUMNS, \
                 [Store].[Store Country].Members ON ROWS FROM [Sales] WHERE [Time].[1997]";
    let cellset = client.execute_cellset(query, "FoodMart")?;

    assert_eq!(cellset.axes().len(), 2);
    let columns = cellset.axis(0).unwrap();
    assert_eq!(columns.hierarchies, vec!["[Measures]"]);
    assert_eq!(columns.positions.len(), 2);
    assert_eq!(columns.positions[1].members[0].caption, "Store Cost");

    let rows = cellset.axis(1).unwrap();
    let usa = &rows.positions[0].members[0];
    assert_eq!(usa.unique_name, "[Store].[USA]");
    assert_eq!(usa.level_unique_name, "[Store].[Store Country]");
    assert_eq!(usa.display_info, Some(65539));
    assert_eq!(usa.properties.get("LNum").map(String::as_str), Some("1"));

    let slicer = cellset.slicer().unwrap();
    assert_eq!(slicer.ordinal, -1);
    assert_eq!(slicer.positions[0].members[0].unique_name, "[Time].[1997]");

    assert_eq!(cellset.cell_at(&[0, 0]).unwrap().value, Some(CellValue::Integer(42)));
    assert_eq!(cellset.cell_at(&[1, 0]).unwrap().value, Some(CellValue::Double(3.5)));
    assert_eq!(
        cellset.cell_at(&[0, 1]).unwrap().value,
        Some(CellValue::String("North".to_string()))
    );
    assert_eq!(cellset.cell_at(&[1, 0]).unwrap().formatted_value, "3.50");
    assert!(cellset.cell_at(&[1, 1]).is_none());

    let (method, body) = client.transport().requests().remove(0);
    assert_eq!(method, XmlaMethod::Execute);
    assert!(body.contains("<Format>Multidimensional</Format>"));
    assert!(body.contains("<AxisFormat>TupleFormat</AxisFormat>"));
    assert!(body.contains("<Catalog>FoodMart</Catalog>"));
    assert!(body.contains("[Time].[1997]</Statement>"));
    Ok(())
}

#[derive(Default)]
struct Trace {
    events: Vec<String>,
}

impl CellsetHandler for Trace {
    fn axis_info(&mut self, name: &str, ordinal: i32) {
        self.events.push(format!("axis_info {name} {ordinal}"));
    }
    fn hier_info(&mut self, hierarchy: &str, axis_ordinal: i32, number: usize) {
        self.events
            .push(format!("hier_info {hierarchy} {axis_ordinal} {number}"));
    }
    fn axis(&mut self, name: &str, ordinal: i32) {
        self.events.push(format!("axis {name} {ordinal}"));
    }
    fn tuple(&mut self, axis_ordinal: i32, position_ordinal: usize) {
        self.events
            .push(format!("tuple {axis_ordinal} {position_ordinal}"));
    }
    fn member(&mut self, member: MemberRef, axis_ordinal: i32, position_ordinal: usize, index: usize) {
        self.events.push(format!(
            "member {} {axis_ordinal} {position_ordinal} {index}",
            member.unique_name
        ));
    }
    fn cell_data_begin(&mut self) {
        self.events.push("cell_data_begin".to_string());
    }
    fn cell(&mut self, ordinal: usize, _value: Option<CellValue>, _fmt: String, _font: Option<String>) {
        self.events.push(format!("cell {ordinal}"));
    }
}

#[test]
fn execute_drives_handler_in_document_order() -> Result<()> {
    let client = client(&[MS_EXECUTE]).with_data_source(MONDRIAN_DS);
    let mut trace = Trace::default();
    client.execute("SELECT ...", "FoodMart", &mut trace)?;

    assert_eq!(
        trace.events,
        vec![
            "axis_info Axis0 0",
            "hier_info [Measures] 0 0",
            "axis_info Axis1 1",
            "hier_info [Store] 1 0",
            "axis_info SlicerAxis -1",
            "hier_info [Time] -1 0",
            "axis Axis0 0",
            "tuple 0 0",
            "member [Measures].[Unit Sales] 0 0 0",
            "tuple 0 1",
            "member [Measures].[Store Cost] 0 1 0",
            "axis Axis1 1",
            "tuple 1 0",
            "member [Store].[USA] 1 0 0",
            "tuple 1 1",
            "member [Store].[Canada] 1 1 0",
            "axis SlicerAxis -1",
            "tuple -1 0",
            "member [Time].[1997] -1 0 0",
            "cell_data_begin",
            "cell 0",
            "cell 1",
            "cell 2",
        ]
    );
    Ok(())
}

#[test]
fn server_fault_short_circuits_execute() {
    let client = client(&[BAD_QUERY_FAULT]).with_data_source(MONDRIAN_DS);
    let mut trace = Trace::default();
    let err = client
        .execute("SELECT FROM", "FoodMart", &mut trace)
        .unwrap_err();

    assert!(trace.events.is_empty());
    assert_eq!(err.operation(), Some(&Operation::Execute));
    let fault = err.fault().unwrap();
    assert_eq!(fault.fault_code, "Client.BadQuery");
    assert_eq!(fault.fault_string, "Syntax error at line 1, column 8");
    assert_eq!(
        fault.detail.as_deref(),
        Some("Description = Parser error; ErrorCode = 3238658057")
    );
}

#[test]
fn missing_cell_data_keeps_emitted_events_and_fails() {
    let client = client(&[MS_EXECUTE_NO_CELLDATA]).with_data_source(MONDRIAN_DS);
    let mut trace = Trace::default();
    let err = client
        .execute("SELECT ...", "FoodMart", &mut trace)
        .unwrap_err();

    assert!(matches!(err, XmlaError::Protocol { .. }));
    assert_eq!(
        trace.events.last().map(String::as_str),
        Some("cell_data_begin")
    );
    assert!(trace.events.contains(&"member [Measures].[Unit Sales] 0 0 0".to_string()));
}

#[test]
fn drillthrough_accumulates_columns() -> Result<()> {
    let client = client(&[MS_DRILLTHROUGH]).with_data_source(MONDRIAN_DS);
    let table = client.execute_drillthrough_table(
        "DRILLTHROUGH SELECT FROM [Sales]",
        "FoodMart",
    )?;

    assert_eq!(table.column_names(), vec!["A", "B", "C"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.value(0, "B"), Some("2"));
    assert_eq!(table.value(1, "A"), None);
    assert_eq!(table.value(1, "C"), Some("4"));

    let body = client.transport().last_request();
    assert!(body.contains("<Format>Tabular</Format>"));
    assert!(!body.contains("AxisFormat"));
    Ok(())
}

#[test]
fn multidimensional_answer_to_drillthrough_is_a_protocol_error() {
    let client = client(&[MS_EXECUTE]).with_data_source(MONDRIAN_DS);
    let err = client
        .execute_drillthrough_table("DRILLTHROUGH ...", "FoodMart")
        .unwrap_err();
    assert!(matches!(err, XmlaError::Protocol { .. }));
    assert_eq!(err.operation(), Some(&Operation::ExecuteDrillthrough));
}

#[test]
fn transport_failure_names_the_operation() {
    let client = client(&[]).with_data_source(MONDRIAN_DS);
    client.transport().push_failure("connection refused");

    let err = client.discover_catalogs().unwrap_err();
    assert!(matches!(err, XmlaError::Transport { .. }));
    assert_eq!(err.operation(), Some(&Operation::discover("DBSCHEMA_CATALOGS")));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn malformed_envelope_is_a_transport_error() {
    let client = client(&["<html>502 Bad Gateway</html>"]).with_data_source(MONDRIAN_DS);
    let err = client.execute_cellset("SELECT ...", "FoodMart").unwrap_err();
    assert!(matches!(err, XmlaError::Transport { .. }));
}

/// Compte les lignes sans les interpréter
struct Counter(usize);

impl RowHandler for Counter {
    fn handle_row(&mut self, _row: &Element, _dialect: Dialect) {
        self.0 += 1;
    }
}

#[test]
fn custom_row_handlers_receive_dialect_rows() -> Result<()> {
    let client = client(&[MS_DATASOURCES]);
    let mut counter = Counter(0);
    client.discover("DISCOVER_DATASOURCES", Some(&[]), &[], &mut counter)?;
    assert_eq!(counter.0, 1);
    assert_eq!(client.dialect(), Dialect::Microsoft);
    Ok(())
}
