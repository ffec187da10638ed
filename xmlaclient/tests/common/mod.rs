//! Transport en mémoire et réponses SOAP de référence
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use xmlaclient::{Endpoint, Transport, TransportError, XmlaClient};
use xmlasoap::{SoapEnvelope, XmlaMethod, parse_soap_envelope};

/// Rejoue des réponses dans l'ordre et garde les requêtes reçues
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<Result<String, String>>>,
    requests: RefCell<Vec<(XmlaMethod, String)>>,
}

impl MockTransport {
    pub fn new(responses: &[&str]) -> Self {
        let transport = Self::default();
        for response in responses {
            transport.push(response);
        }
        transport
    }

    pub fn push(&self, response: &str) {
        self.responses
            .borrow_mut()
            .push_back(Ok(response.to_string()));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<(XmlaMethod, String)> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> String {
        self.requests
            .borrow()
            .last()
            .map(|(_, body)| body.clone())
            .unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        _endpoint: &Endpoint,
        method: XmlaMethod,
        body_xml: &str,
    ) -> Result<SoapEnvelope, TransportError> {
        self.requests
            .borrow_mut()
            .push((method, body_xml.to_string()));
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(raw)) => Ok(parse_soap_envelope(raw.as_bytes())?),
            Some(Err(message)) => Err(TransportError::Other(message)),
            None => Err(TransportError::Other("no canned response left".to_string())),
        }
    }
}

pub fn client(responses: &[&str]) -> XmlaClient<MockTransport> {
    let endpoint = Endpoint::parse("http://localhost:8080/xmla").unwrap();
    XmlaClient::with_transport(endpoint, MockTransport::new(responses))
}

pub const MONDRIAN_DS: &str = "Provider=Mondrian;DataSource=FoodMart;";

pub const MS_DATASOURCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:DiscoverResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row>
            <DataSourceName>FoodMart</DataSourceName>
            <DataSourceDescription>Mondrian FoodMart</DataSourceDescription>
            <URL>http://localhost:8080/xmla</URL>
            <DataSourceInfo>Provider=Mondrian;DataSource=FoodMart;</DataSourceInfo>
            <ProviderName>Mondrian</ProviderName>
            <ProviderType>MDP</ProviderType>
            <AuthenticationMode>Unauthenticated</AuthenticationMode>
          </row>
        </root>
      </m:return>
    </m:DiscoverResponse>
  </soap:Body>
</soap:Envelope>"#;

/// Deux sources : la seconde ne redonne que `DataSourceInfo`
pub const MS_TWO_DATASOURCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:DiscoverResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row>
            <DataSourceName>FoodMart</DataSourceName>
            <DataSourceInfo>Provider=Mondrian;DataSource=FoodMart;</DataSourceInfo>
          </row>
          <row>
            <DataSourceInfo>Provider=Mondrian;DataSource=SteelWheels;</DataSourceInfo>
          </row>
        </root>
      </m:return>
    </m:DiscoverResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const SAP_DATASOURCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <DiscoverResponse xmlns="urn:schemas-microsoft-com:xml-analysis">
      <return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row>
            <DataSourceName>SAP_BW</DataSourceName>
            <DataSourceDescription>SAP BW Release 7.0</DataSourceDescription>
            <ProviderName>SAP BW</ProviderName>
            <ProviderType>MDP</ProviderType>
          </row>
        </root>
      </return>
    </DiscoverResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

pub const SAP_DATASOURCES_INCOMPLETE: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <DiscoverResponse xmlns="urn:schemas-microsoft-com:xml-analysis">
      <return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row><DataSourceName>SAP_BW</DataSourceName></row>
        </root>
      </return>
    </DiscoverResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

pub const MS_EMPTY_ROWSET: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:DiscoverResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset"/>
      </m:return>
    </m:DiscoverResponse>
  </soap:Body>
</soap:Envelope>"#;

/// Réponse sans DiscoverResponse : dialecte indéterminable
pub const UNRECOGNIZED: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <Something xmlns="urn:example"/>
  </soap:Body>
</soap:Envelope>"#;

/// MDSCHEMA_CUBES au format SAP (pas de préfixe)
pub const SAP_STYLE_CUBES: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <DiscoverResponse xmlns="urn:schemas-microsoft-com:xml-analysis">
      <return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row>
            <CATALOG_NAME>FoodMart</CATALOG_NAME>
            <CUBE_NAME>Sales</CUBE_NAME>
            <CUBE_TYPE>CUBE</CUBE_TYPE>
            <DESCRIPTION>FoodMart Schema - Sales Cube</DESCRIPTION>
          </row>
          <row>
            <CATALOG_NAME>FoodMart</CATALOG_NAME>
            <CUBE_NAME>Warehouse</CUBE_NAME>
            <CUBE_TYPE>CUBE</CUBE_TYPE>
          </row>
        </root>
      </return>
    </DiscoverResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

pub const MS_MEMBERS: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:DiscoverResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row>
            <CATALOG_NAME>FoodMart</CATALOG_NAME>
            <CUBE_NAME>Sales</CUBE_NAME>
            <DIMENSION_UNIQUE_NAME>[Store]</DIMENSION_UNIQUE_NAME>
            <HIERARCHY_UNIQUE_NAME>[Store]</HIERARCHY_UNIQUE_NAME>
            <LEVEL_UNIQUE_NAME>[Store].[Store State]</LEVEL_UNIQUE_NAME>
            <LEVEL_NUMBER>2</LEVEL_NUMBER>
            <MEMBER_NAME>CA</MEMBER_NAME>
            <MEMBER_UNIQUE_NAME>[Store].[USA].[CA]</MEMBER_UNIQUE_NAME>
            <MEMBER_CAPTION>California</MEMBER_CAPTION>
            <CHILDREN_CARDINALITY>4</CHILDREN_CARDINALITY>
          </row>
        </root>
      </m:return>
    </m:DiscoverResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const MS_EXECUTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:ExecuteResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:mddataset"
              xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
              xmlns:xsd="http://www.w3.org/2001/XMLSchema">
          <OlapInfo>
            <CubeInfo><Cube><CubeName>Sales</CubeName></Cube></CubeInfo>
            <AxesInfo>
              <AxisInfo name="Axis0">
                <HierarchyInfo name="[Measures]">
                  <UName name="[Measures].[MEMBER_UNIQUE_NAME]"/>
                </HierarchyInfo>
              </AxisInfo>
              <AxisInfo name="Axis1">
                <HierarchyInfo name="[Store]"/>
              </AxisInfo>
              <AxisInfo name="SlicerAxis">
                <HierarchyInfo name="[Time]"/>
              </AxisInfo>
            </AxesInfo>
            <CellInfo>
              <Value name="VALUE"/>
              <FmtValue name="FORMATTED_VALUE"/>
            </CellInfo>
          </OlapInfo>
          <Axes>
            <Axis name="Axis0">
              <Tuples>
                <Tuple>
                  <Member Hierarchy="[Measures]">
                    <UName>[Measures].[Unit Sales]</UName>
                    <Caption>Unit Sales</Caption>
                    <LName>[Measures].[MeasuresLevel]</LName>
                    <LNum>0</LNum>
                    <DisplayInfo>0</DisplayInfo>
                  </Member>
                </Tuple>
                <Tuple>
                  <Member Hierarchy="[Measures]">
                    <UName>[Measures].[Store Cost]</UName>
                    <Caption>Store Cost</Caption>
                    <LName>[Measures].[MeasuresLevel]</LName>
                    <LNum>0</LNum>
                    <DisplayInfo>0</DisplayInfo>
                  </Member>
                </Tuple>
              </Tuples>
            </Axis>
            <Axis name="Axis1">
              <Tuples>
                <Tuple>
                  <Member Hierarchy="[Store]">
                    <UName>[Store].[USA]</UName>
                    <Caption>USA</Caption>
                    <LName>[Store].[Store Country]</LName>
                    <LNum>1</LNum>
                    <DisplayInfo>65539</DisplayInfo>
                  </Member>
                </Tuple>
                <Tuple>
                  <Member Hierarchy="[Store]">
                    <UName>[Store].[Canada]</UName>
                    <Caption>Canada</Caption>
                    <LName>[Store].[Store Country]</LName>
                    <LNum>1</LNum>
                    <DisplayInfo>65537</DisplayInfo>
                  </Member>
                </Tuple>
              </Tuples>
            </Axis>
            <Axis name="SlicerAxis">
              <Tuples>
                <Tuple>
                  <Member Hierarchy="[Time]">
                    <UName>[Time].[1997]</UName>
                    <Caption>1997</Caption>
                    <LName>[Time].[Year]</LName>
                    <LNum>0</LNum>
                    <DisplayInfo>4</DisplayInfo>
                  </Member>
                </Tuple>
              </Tuples>
            </Axis>
          </Axes>
          <CellData>
            <Cell CellOrdinal="0">
              <Value xsi:type="xsd:int">42</Value>
              <FmtValue>42</FmtValue>
            </Cell>
            <Cell CellOrdinal="1">
              <Value xsi:type="xsd:double">3.5</Value>
              <FmtValue>3.50</FmtValue>
            </Cell>
            <Cell CellOrdinal="2">
              <Value>North</Value>
              <FmtValue>North</FmtValue>
            </Cell>
          </CellData>
        </root>
      </m:return>
    </m:ExecuteResponse>
  </soap:Body>
</soap:Envelope>"#;

/// Execute sans CellData
pub const MS_EXECUTE_NO_CELLDATA: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:ExecuteResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:mddataset">
          <OlapInfo>
            <AxesInfo>
              <AxisInfo name="Axis0"><HierarchyInfo name="[Measures]"/></AxisInfo>
            </AxesInfo>
          </OlapInfo>
          <Axes>
            <Axis name="Axis0">
              <Tuples>
                <Tuple><Member Hierarchy="[Measures]"><UName>[Measures].[Unit Sales]</UName></Member></Tuple>
              </Tuples>
            </Axis>
          </Axes>
        </root>
      </m:return>
    </m:ExecuteResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const MS_DRILLTHROUGH: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <m:ExecuteResponse xmlns:m="urn:schemas-microsoft-com:xml-analysis">
      <m:return>
        <root xmlns="urn:schemas-microsoft-com:xml-analysis:rowset">
          <row><A>1</A><B>2</B></row>
          <row><B>3</B><C>4</C></row>
        </root>
      </m:return>
    </m:ExecuteResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const BAD_QUERY_FAULT: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>Client.BadQuery</faultcode>
      <faultstring>Syntax error at line 1, column 8</faultstring>
      <detail>
        <Error xmlns="urn:schemas-microsoft-com:xml-analysis" ErrorCode="3238658057" Description="Parser error"/>
      </detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;
