#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use mtab_core::AnyEmptyResult;

pub const MODEL_V1_FILE: &str = "model-1-0.xml";
pub const MODEL_V2_FILE: &str = "model-1-1.xml";
pub const BIBLIOGRAPHY_FILE: &str = "test-biblio.xml";

pub const MODEL_V1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dm:document xmlns:dm="urn:broadband-forum-org:cwmp:datamodel-1-0">
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

pub const MODEL_V2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
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
  </model>
</dm:document>
"#;

pub const BIBLIOGRAPHY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dm:document xmlns:dm="urn:broadband-forum-org:cwmp:datamodel-1-0">
  <bibliography>
    <reference id="RFC1">
      <name>RFC 1</name>
      <title>Host Software</title>
      <organization>IETF</organization>
      <hyperlink>https://www.rfc-editor.org/rfc/rfc1</hyperlink>
    </reference>
  </bibliography>
</dm:document>
"#;

pub fn mtab_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mtab"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// Write both model versions and the bibliography into `root`.
pub fn write_models(root: &Path) -> AnyEmptyResult {
	std::fs::write(root.join(MODEL_V1_FILE), MODEL_V1)?;
	std::fs::write(root.join(MODEL_V2_FILE), MODEL_V2)?;
	std::fs::write(root.join(BIBLIOGRAPHY_FILE), BIBLIOGRAPHY)?;

	Ok(())
}
