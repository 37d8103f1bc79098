use std::collections::HashMap;

use crate::ContainerSpec;
use crate::Document;
use crate::FileResolver;
use crate::ModelTable;
use crate::MtabError;
use crate::MtabResult;
use crate::Row;
use crate::Table;
use crate::TableParser;

pub(crate) const MODEL_V1_FILE: &str = "model-1-0.xml";
pub(crate) const MODEL_V2_FILE: &str = "model-1-1.xml";
pub(crate) const BIBLIOGRAPHY_FILE: &str = "test-biblio.xml";

pub(crate) const MODEL_V1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dm:document xmlns:dm="urn:broadband-forum-org:cwmp:datamodel-1-0">
  <!-- the first release -->
  <model name="Device:1.0">
    <object name="Device." access="readOnly" minEntries="1" maxEntries="1">
      <description>The top-level object.</description>
    </object>
    <object name="Device.Foo.{i}." access="readWrite" minEntries="0" maxEntries="unbounded">
      <description>A foo entry.</description>
      <parameter name="Enable" access="readWrite">
        <description>Enables the foo. See also {{param|Name}}.</description>
        <syntax>
          <boolean/>
          <default type="object" value="false"/>
        </syntax>
      </parameter>
      <parameter name="Name" access="readWrite">
        <description>Name of the foo.</description>
        <syntax>
          <string>
            <size maxLength="64"/>
          </string>
        </syntax>
      </parameter>
    </object>
  </model>
</dm:document>
"#;

pub(crate) const MODEL_V2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dm:document xmlns:dm="urn:broadband-forum-org:cwmp:datamodel-1-0">
  <import file="model-1-0.xml">
    <model name="Device:1.0"/>
  </import>
  <import file="test-biblio.xml"/>
  <model name="Device:1.1" base="Device:1.0">
    <object base="Device.Foo.{i}." access="readWrite" minEntries="0" maxEntries="unbounded">
      <description action="replace">A foo entry, see {{bibref|RFC1|Section 2}}.</description>
      <parameter name="Status" access="readOnly" dmr:previousParameter="Name">
        <description>Status of the foo. {{enum}}</description>
        <syntax>
          <string>
            <enumeration value="Up"/>
            <enumeration value="Down"/>
          </string>
        </syntax>
      </parameter>
    </object>
    <profile name="Foo:1" dmr:previousProfile="">
      <description>Minimal foo support.</description>
    </profile>
  </model>
</dm:document>
"#;

pub(crate) const BIBLIOGRAPHY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dm:document xmlns:dm="urn:broadband-forum-org:cwmp:datamodel-1-0">
  <bibliography>
    <reference id="RFC1">
      <name>RFC 1</name>
      <title>Host Software</title>
      <organization>IETF</organization>
      <category>RFC</category>
      <date>1969-04</date>
      <hyperlink>https://www.rfc-editor.org/rfc/rfc1</hyperlink>
    </reference>
    <reference id="TR-069">
      <name>TR-069</name>
      <title>CPE WAN Management Protocol</title>
      <organization>Broadband Forum</organization>
    </reference>
  </bibliography>
</dm:document>
"#;

pub(crate) const COMPONENT_MODEL: &str = r#"<dm:document>
  <component name="Stats">
    <description>Statistics for an interface.</description>
    <object name="Stats." access="readOnly" minEntries="1" maxEntries="1">
      <description>Counters.</description>
      <parameter name="BytesSent" access="readOnly">
        <description>Bytes sent.</description>
        <syntax><unsignedLong/></syntax>
      </parameter>
    </object>
  </component>
  <model name="Device:1.0">
    <object name="Device.Interface.{i}." access="readOnly" minEntries="0" maxEntries="unbounded">
      <description>An interface.</description>
    </object>
    <component ref="Stats" path="Device.Interface.{i}." dmr:previousObject=""/>
    <object name="Device.Other." access="readOnly" minEntries="1" maxEntries="1">
      <description>Comes after the statistics.</description>
    </object>
  </model>
</dm:document>
"#;

pub(crate) fn model_document(text: &str, version: &str) -> MtabResult<Document> {
	Ok(Document::parse(text)?.with_version(version))
}

/// Parse the model `version` out of `text` with the default parser.
pub(crate) fn model_table(text: &str, version: &str) -> MtabResult<ModelTable> {
	let doc = model_document(text, version)?;
	let parsed = TableParser::default().parse_container(&doc, &ContainerSpec::model(version), None)?;
	Ok(parsed.table)
}

/// Two-column table with the version in column 0 and a description in
/// column 1.
pub(crate) fn two_column_table(version: &str, rows: &[(&str, [&str; 2])]) -> ModelTable {
	let mut table = Table::new().with_version(version);

	for (key, values) in rows {
		table.insert(*key, Row::from_values(*values));
	}

	ModelTable::new(table)
}

/// Serves documents from memory.
#[derive(Debug, Default)]
pub(crate) struct MemoryResolver {
	files: HashMap<String, String>,
}

impl MemoryResolver {
	pub(crate) fn with_file(mut self, name: &str, text: &str) -> Self {
		self.files.insert(name.to_string(), text.to_string());
		self
	}
}

impl FileResolver for MemoryResolver {
	fn resolve(&self, name: &str) -> MtabResult<String> {
		self.files
			.get(name)
			.cloned()
			.ok_or_else(|| MtabError::FileNotFound(name.to_string()))
	}
}

pub(crate) fn model_resolver() -> MemoryResolver {
	MemoryResolver::default()
		.with_file(MODEL_V1_FILE, MODEL_V1)
		.with_file(MODEL_V2_FILE, MODEL_V2)
		.with_file(BIBLIOGRAPHY_FILE, BIBLIOGRAPHY)
}
