//! Common test fixtures for OGC client tests.
//!
//! Responses are trimmed captures of what GeoServer returns for the
//! `topp:states` demo layer and friends.

/// Base URLs used throughout the tests.
pub mod endpoints {
    pub const WMS: &str = "http://localhost:8080/geoserver/wms";
    pub const WFS: &str = "http://localhost:8080/geoserver/wfs";
    pub const TOPP_NS: &str = "http://www.openplans.org/topp";
}

/// WFS 1.1.0 GetCapabilities with two feature types.
pub const WFS_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="1.1.0"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:ows="http://www.opengis.net/ows"
    xmlns:topp="http://www.openplans.org/topp"
    xmlns:tiger="http://www.census.gov">
  <ows:ServiceIdentification>
    <ows:Title>GeoServer Web Feature Service</ows:Title>
    <ows:Abstract>This is the reference implementation of WFS 1.1.0</ows:Abstract>
    <ows:ServiceType>WFS</ows:ServiceType>
  </ows:ServiceIdentification>
  <FeatureTypeList>
    <FeatureType>
      <Name>topp:states</Name>
      <Title>USA Population</Title>
      <Abstract>This is some census data on the states.</Abstract>
      <ows:Keywords>
        <ows:Keyword>census</ows:Keyword>
        <ows:Keyword>united</ows:Keyword>
        <ows:Keyword>boundaries</ows:Keyword>
      </ows:Keywords>
      <DefaultSRS>urn:x-ogc:def:crs:EPSG:4326</DefaultSRS>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-124.731422 24.955967</ows:LowerCorner>
        <ows:UpperCorner>-66.969849 49.371735</ows:UpperCorner>
      </ows:WGS84BoundingBox>
    </FeatureType>
    <FeatureType>
      <Name>tiger:poi</Name>
      <Title>Manhattan (NY) points of interest</Title>
      <DefaultSRS>urn:x-ogc:def:crs:EPSG:4326</DefaultSRS>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-74.0118315772888 40.70754683896324</ows:LowerCorner>
        <ows:UpperCorner>-74.00153046439813 40.719885123828675</ows:UpperCorner>
      </ows:WGS84BoundingBox>
    </FeatureType>
  </FeatureTypeList>
</wfs:WFS_Capabilities>"#;

/// WMS 1.3.0 GetCapabilities: an unnamed root group holding a layer with
/// one style, a layer with two styles and a nested base group.
pub const WMS_CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>GeoServer Web Map Service</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>GeoServer Web Map Service</Title>
      <CRS>EPSG:4326</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>-180.0</westBoundLongitude>
        <eastBoundLongitude>180.0</eastBoundLongitude>
        <southBoundLatitude>-90.0</southBoundLatitude>
        <northBoundLatitude>90.0</northBoundLatitude>
      </EX_GeographicBoundingBox>
      <Layer queryable="1">
        <Name>topp:states</Name>
        <Title>USA Population</Title>
        <Abstract>This is some census data on the states.</Abstract>
        <KeywordList>
          <Keyword>census</Keyword>
          <Keyword>state</Keyword>
        </KeywordList>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>-124.731422</westBoundLongitude>
          <eastBoundLongitude>-66.969849</eastBoundLongitude>
          <southBoundLatitude>24.955967</southBoundLatitude>
          <northBoundLatitude>49.371735</northBoundLatitude>
        </EX_GeographicBoundingBox>
        <Style>
          <Name>population</Name>
          <Title>Population in the United States</Title>
          <LegendURL width="20" height="20">
            <Format>image/png</Format>
            <OnlineResource xlink:type="simple" xlink:href="http://localhost:8080/geoserver/wms?request=GetLegendGraphic&amp;format=image%2Fpng&amp;layer=topp%3Astates"/>
          </LegendURL>
        </Style>
      </Layer>
      <Layer queryable="0">
        <Name>nurc:Arc_Sample</Name>
        <Title>A sample ArcGrid file</Title>
        <Dimension name="time" units="ISO8601" default="2020-01-02T00:00:00Z">2020-01-01T00:00:00Z,2020-01-02T00:00:00Z</Dimension>
        <Style>
          <Name>rain</Name>
          <LegendURL><OnlineResource xlink:href="http://localhost:8080/rain.png"/></LegendURL>
        </Style>
        <Style>
          <Name>raster</Name>
          <LegendURL><OnlineResource xlink:href="http://localhost:8080/raster.png"/></LegendURL>
        </Style>
      </Layer>
      <Layer>
        <Name>base</Name>
        <Title>Base maps</Title>
        <Layer queryable="1">
          <Name>ne:countries</Name>
          <Title>Countries</Title>
        </Layer>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

/// WFS 1.0.0 DescribeFeatureType for `topp:states`, attributes in
/// document order `Zipcode`, `Name`, `age`.
pub const DESCRIBE_FEATURE_TYPE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:gml="http://www.opengis.net/gml"
    xmlns:topp="http://www.openplans.org/topp"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    elementFormDefault="qualified"
    targetNamespace="http://www.openplans.org/topp">
  <xsd:import namespace="http://www.opengis.net/gml"
      schemaLocation="http://localhost:8080/geoserver/schemas/gml/2.1.2/feature.xsd"/>
  <xsd:complexType name="statesType">
    <xsd:complexContent>
      <xsd:extension base="gml:AbstractFeatureType">
        <xsd:sequence>
          <xsd:element maxOccurs="1" minOccurs="0" name="boundedBy" nillable="true" type="gml:BoxPropertyType"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="Zipcode" nillable="true" type="xsd:string"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="the_geom" nillable="true" type="gml:PointPropertyType"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="Name" nillable="true" type="xsd:string"/>
          <xsd:element maxOccurs="1" minOccurs="0" name="age" nillable="true" type="xsd:int"/>
        </xsd:sequence>
      </xsd:extension>
    </xsd:complexContent>
  </xsd:complexType>
  <xsd:element name="states" substitutionGroup="gml:_Feature" type="topp:statesType"/>
</xsd:schema>"#;

/// WMS 1.1.1 style exception report, as GeoServer returns for an unknown type.
pub const SERVICE_EXCEPTION_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.2.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="InvalidParameterValue">
    Could not find type: {http://www.openplans.org/topp}nope
  </ServiceException>
</ServiceExceptionReport>"#;

/// OWS 1.0 exception report.
pub const OWS_EXCEPTION_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport version="1.0.0" xmlns:ows="http://www.opengis.net/ows">
  <ows:Exception exceptionCode="NoApplicableCode">
    <ows:ExceptionText>Error performing insert: null value in column "STATE_NAME" violates not-null constraint</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

/// Build a WFS 1.1.0 transaction response with the given totals and inserted ids.
pub fn transaction_response(inserted: &[&str], updated: u32, deleted: u32) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:TransactionResponse version="1.1.0" xmlns:wfs="http://www.opengis.net/wfs" xmlns:ogc="http://www.opengis.net/ogc">
  <wfs:TransactionSummary>"#,
    );
    xml.push_str(&format!(
        "<wfs:totalInserted>{}</wfs:totalInserted><wfs:totalUpdated>{}</wfs:totalUpdated><wfs:totalDeleted>{}</wfs:totalDeleted>",
        inserted.len(),
        updated,
        deleted
    ));
    xml.push_str("</wfs:TransactionSummary><wfs:TransactionResults/>");
    xml.push_str("<wfs:InsertResults>");
    for id in inserted {
        xml.push_str(&format!(
            "<wfs:Feature><ogc:FeatureId fid=\"{}\"/></wfs:Feature>",
            id
        ));
    }
    xml.push_str("</wfs:InsertResults></wfs:TransactionResponse>");
    xml
}

/// WFS 1.1.0 GetFeature response for `srsName=EPSG:4326`: GeoServer
/// declares the lon/lat `epsg.xml#4326` reference.
pub const GML_FEATURE_COLLECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection numberOfFeatures="2"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:gml="http://www.opengis.net/gml"
    xmlns:topp="http://www.openplans.org/topp"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <gml:featureMembers>
    <topp:states gml:id="states.1">
      <gml:boundedBy>
        <gml:Envelope srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
          <gml:lowerCorner>-91.5 36.9</gml:lowerCorner>
          <gml:upperCorner>-87.5 42.5</gml:upperCorner>
        </gml:Envelope>
      </gml:boundedBy>
      <topp:the_geom>
        <gml:Point srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
          <gml:pos>-89.5 40.0</gml:pos>
        </gml:Point>
      </topp:the_geom>
      <topp:STATE_NAME>Illinois</topp:STATE_NAME>
      <topp:PERSONS>11430602</topp:PERSONS>
      <topp:NOTE xsi:nil="true"/>
    </topp:states>
    <topp:states gml:id="states.2">
      <topp:the_geom>
        <gml:MultiSurface srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
          <gml:surfaceMember>
            <gml:Polygon>
              <gml:exterior>
                <gml:LinearRing>
                  <gml:posList>-77.0 38.8 -77.1 38.9 -76.9 39.0 -77.0 38.8</gml:posList>
                </gml:LinearRing>
              </gml:exterior>
            </gml:Polygon>
          </gml:surfaceMember>
        </gml:MultiSurface>
      </topp:the_geom>
      <topp:STATE_NAME>District of Columbia</topp:STATE_NAME>
      <topp:PERSONS>606900</topp:PERSONS>
    </topp:states>
  </gml:featureMembers>
</wfs:FeatureCollection>"#;

/// One-feature `topp:states` collection whose point declares `srs_name`
/// (omitted when `None`) and carries `pos` verbatim.
pub fn gml_point_collection(srs_name: Option<&str>, pos: &str) -> String {
    let srs_attr = srs_name
        .map(|srs| format!(" srsName=\"{}\"", srs))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection numberOfFeatures="1"
    xmlns:wfs="http://www.opengis.net/wfs"
    xmlns:gml="http://www.opengis.net/gml"
    xmlns:topp="http://www.openplans.org/topp">
  <gml:featureMember>
    <topp:states gml:id="states.1">
      <topp:the_geom><gml:Point{}><gml:pos>{}</gml:pos></gml:Point></topp:the_geom>
      <topp:STATE_NAME>Illinois</topp:STATE_NAME>
    </topp:states>
  </gml:featureMember>
</wfs:FeatureCollection>"#,
        srs_attr, pos
    )
}

/// `resultType=hits` response.
pub const HITS_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection numberOfFeatures="49" timeStamp="2015-09-01T10:00:00.000Z"
    xmlns:wfs="http://www.opengis.net/wfs"/>"#;

/// GeoJSON GetFeature / GetFeatureInfo response.
pub const GEOJSON_FEATURE_COLLECTION: &str = r#"{
  "type": "FeatureCollection",
  "totalFeatures": 1,
  "features": [
    {
      "type": "Feature",
      "id": "states.1",
      "geometry": {"type": "Point", "coordinates": [-89.5, 40.0]},
      "geometry_name": "the_geom",
      "properties": {"STATE_NAME": "Illinois", "PERSONS": 11430602}
    }
  ],
  "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}}
}"#;
