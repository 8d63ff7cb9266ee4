use super::*;

const CAMUNDA_DEFINITION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:camunda="http://camunda.org/schema/1.0/bpmn"
                  id="Definitions_1">
  <bpmn:process id="InvoiceProcess" isExecutable="true">
    <bpmn:serviceTask id="ReviewInvoice" name="Review invoice" camunda:type="external" camunda:topic="taskbridge">
      <bpmn:documentation>Check the invoice total &amp; the supplier.</bpmn:documentation>
      <bpmn:extensionElements>
        <camunda:properties>
          <camunda:property name="service.type" value="assistant" />
          <camunda:property name="service.name" value="invoice-assistant" />
          <camunda:property name="priority" value="high" />
        </camunda:properties>
      </bpmn:extensionElements>
      <bpmn:incoming>Flow_1</bpmn:incoming>
    </bpmn:serviceTask>
    <bpmn:serviceTask id="Archive" name="Archive" />
  </bpmn:process>
</bpmn:definitions>"#;

#[test]
fn test_parse_camunda_properties() {
    let parsed = parse_definition("invoice:1", CAMUNDA_DEFINITION).unwrap();
    let review = parsed.activity("ReviewInvoice").unwrap();

    assert_eq!(
        review.properties,
        vec![
            ("service.type".to_string(), "assistant".to_string()),
            ("service.name".to_string(), "invoice-assistant".to_string()),
            ("priority".to_string(), "high".to_string()),
        ]
    );
    assert_eq!(
        review.documentation.as_deref(),
        Some("Check the invoice total & the supplier.")
    );
}

#[test]
fn test_unannotated_activity_is_absent() {
    let parsed = parse_definition("invoice:1", CAMUNDA_DEFINITION).unwrap();
    assert!(parsed.activity("Archive").is_none());
    assert!(parsed.activity("Missing").is_none());
}

#[test]
fn test_parse_zeebe_properties() {
    let xml = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:zeebe="http://camunda.org/schema/zeebe/1.0">
  <bpmn:process id="P">
    <bpmn:serviceTask id="Lookup">
      <bpmn:extensionElements>
        <zeebe:properties>
          <zeebe:property name="service.type" value="mcp"></zeebe:property>
          <zeebe:property name="service.tool" value="search" />
        </zeebe:properties>
      </bpmn:extensionElements>
    </bpmn:serviceTask>
  </bpmn:process>
</bpmn:definitions>"#;

    let parsed = parse_definition("p:1", xml).unwrap();
    let lookup = parsed.activity("Lookup").unwrap();
    assert_eq!(lookup.properties.len(), 2);
    assert_eq!(lookup.properties[1], ("service.tool".to_string(), "search".to_string()));
}

#[test]
fn test_duplicate_keys_kept_in_document_order() {
    let xml = r#"<definitions><process id="P"><task id="T"><extensionElements><properties>
        <property name="service.name" value="first"/>
        <property name="service.name" value="second"/>
    </properties></extensionElements></task></process></definitions>"#;

    let parsed = parse_definition("p", xml).unwrap();
    let task = parsed.activity("T").unwrap();
    assert_eq!(task.properties[0].1, "first");
    assert_eq!(task.properties[1].1, "second");
}

#[test]
fn test_properties_outside_extension_elements_ignored() {
    let xml = r#"<definitions><process id="P"><task id="T">
        <properties><property name="service.type" value="mcp"/></properties>
    </task></process></definitions>"#;

    let parsed = parse_definition("p", xml).unwrap();
    assert!(parsed.activity("T").is_none());
}

#[test]
fn test_nested_subprocess_activities() {
    let xml = r#"<definitions><process id="P">
      <subProcess id="Sub">
        <extensionElements><properties><property name="level" value="outer"/></properties></extensionElements>
        <task id="Inner">
          <extensionElements><properties><property name="level" value="inner"/></properties></extensionElements>
        </task>
      </subProcess>
    </process></definitions>"#;

    let parsed = parse_definition("p", xml).unwrap();
    assert_eq!(parsed.activity("Sub").unwrap().properties[0].1, "outer");
    assert_eq!(parsed.activity("Inner").unwrap().properties[0].1, "inner");
}

#[test]
fn test_cdata_documentation() {
    let xml = r#"<definitions><process id="P"><task id="T">
        <documentation><![CDATA[Use <b>bold</b> output]]></documentation>
    </task></process></definitions>"#;

    let parsed = parse_definition("p", xml).unwrap();
    assert_eq!(
        parsed.activity("T").unwrap().documentation.as_deref(),
        Some("Use <b>bold</b> output")
    );
}

#[test]
fn test_malformed_document_fails() {
    let xml = "<definitions><process id=\"P\"><task id=\"T\"></process></definitions>";
    let err = parse_definition("broken:1", xml).unwrap_err();
    assert!(matches!(err, MetadataError::Parse { ref definition_id, .. } if definition_id == "broken:1"));
}

#[test]
fn test_truncated_document_fails() {
    let xml = "<definitions><process id=\"P\"><task id=\"T\">";
    assert!(parse_definition("p", xml).is_err());
}

#[test]
fn test_empty_document_fails() {
    assert!(parse_definition("p", "").is_err());
    assert!(parse_definition("p", "not xml at all").is_err());
}
