//! Writes interfaces as AllJoyn introspection XML.

use std::fmt::Write as _;
use std::path::Path;

use t2t_protocol::{Characteristic, Interface, Method, Property, TypeDescriptor};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::error::DocumentError;
use crate::signature;

const DOCTYPE: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN" "http://standards.freedesktop.org/dbus/introspect-1.0.dtd">"#;

/// Writes interfaces to an introspection XML file.
#[instrument(skip_all, fields(path = %path.as_ref().display(), count = interfaces.len()))]
pub async fn write_interfaces_to_file(
    interfaces: &[Interface],
    path: impl AsRef<Path>,
) -> Result<(), DocumentError> {
    let path = path.as_ref();
    let xml = write_interfaces(interfaces)?;
    fs::write(path, xml)
        .await
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes interfaces to introspection XML contents.
///
/// Readable or writable properties become `<property>` elements and every
/// notifying property also becomes a `<signal>` with a single out argument,
/// so reading the output back yields the same capabilities. Only declared
/// members are written; AllJoyn has no notion of interface references.
/// Descriptions are written trimmed and blank ones are omitted, matching
/// what the reader keeps.
pub fn write_interfaces(interfaces: &[Interface]) -> Result<String, DocumentError> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(DOCTYPE);
    xml.push_str("\n<node>\n");
    for interface in interfaces {
        write_interface(&mut xml, interface)?;
    }
    xml.push_str("</node>\n");
    debug!(count = interfaces.len(), bytes = xml.len(), "interfaces written");
    Ok(xml)
}

fn write_interface(xml: &mut String, interface: &Interface) -> Result<(), DocumentError> {
    if !interface.references().is_empty() {
        warn!(
            interface = interface.name(),
            references = interface.references().len(),
            "interface references are not representable and will be dropped"
        );
    }

    let _ = writeln!(xml, "  <interface name=\"{}\">", escape(interface.name()));
    write_description(xml, 4, interface.description());

    for property in interface
        .properties()
        .iter()
        .filter(|property| property.can_read || property.can_write)
    {
        write_property(xml, property)?;
    }
    for property in interface.properties().iter().filter(|property| property.can_notify) {
        write_signal(xml, property)?;
    }
    for method in interface.methods() {
        write_method(xml, method)?;
    }

    xml.push_str("  </interface>\n");
    Ok(())
}

fn write_property(xml: &mut String, property: &Property) -> Result<(), DocumentError> {
    let access = match (property.can_read, property.can_write) {
        (true, true) => "readwrite",
        (false, true) => "write",
        _ => "read",
    };
    let signature = encode("property", &property.name, &property.property_type)?;
    let _ = write!(
        xml,
        "    <property name=\"{}\" access=\"{access}\" type=\"{}\"",
        escape(&property.name),
        escape(&signature)
    );
    if has_description(property.description.as_deref()) {
        xml.push_str(">\n");
        write_description(xml, 6, property.description.as_deref());
        xml.push_str("    </property>\n");
    } else {
        xml.push_str("/>\n");
    }
    Ok(())
}

fn write_signal(xml: &mut String, property: &Property) -> Result<(), DocumentError> {
    let signature = encode("signal", &property.name, &property.property_type)?;
    let _ = writeln!(xml, "    <signal name=\"{}\">", escape(&property.name));
    write_description(xml, 6, property.description.as_deref());
    let _ = writeln!(
        xml,
        "      <arg name=\"{}\" type=\"{}\" direction=\"out\"/>",
        escape(&property.name),
        escape(&signature)
    );
    xml.push_str("    </signal>\n");
    Ok(())
}

fn write_method(xml: &mut String, method: &Method) -> Result<(), DocumentError> {
    if method.parameters.is_empty() && !has_description(method.description.as_deref()) {
        let _ = writeln!(xml, "    <method name=\"{}\"/>", escape(&method.name));
        return Ok(());
    }

    let _ = writeln!(xml, "    <method name=\"{}\">", escape(&method.name));
    write_description(xml, 6, method.description.as_deref());
    for parameter in &method.parameters {
        let signature = encode("argument", &parameter.name, &parameter.parameter_type)?;
        let direction = if parameter.is_out { "out" } else { "in" };
        let _ = write!(
            xml,
            "      <arg name=\"{}\" type=\"{}\" direction=\"{direction}\"",
            escape(&parameter.name),
            escape(&signature)
        );
        if has_description(parameter.description.as_deref()) {
            xml.push_str(">\n");
            write_description(xml, 8, parameter.description.as_deref());
            xml.push_str("      </arg>\n");
        } else {
            xml.push_str("/>\n");
        }
    }
    xml.push_str("    </method>\n");
    Ok(())
}

fn write_description(xml: &mut String, indent: usize, description: Option<&str>) {
    if let Some(description) = description.map(str::trim).filter(|text| !text.is_empty()) {
        let _ = writeln!(
            xml,
            "{:indent$}<description>{}</description>",
            "",
            escape(description)
        );
    }
}

fn has_description(description: Option<&str>) -> bool {
    description.is_some_and(|text| !text.trim().is_empty())
}

fn encode(element: &'static str, name: &str, descriptor: &TypeDescriptor) -> Result<String, DocumentError> {
    signature::encode(descriptor).map_err(|source| DocumentError::Codec {
        element,
        name: name.to_owned(),
        source,
    })
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use anyhow::Result;
    use t2t_protocol::Parameter;

    use super::*;
    use crate::error::CodecError;
    use crate::reader::{read_interfaces, read_interfaces_from_file};

    const EXAMPLE_A: &str = r#"<node>
  <interface name="org.example.A">
    <property name="propA1" access="read" type="s"/>
    <method name="methodA1"/>
  </interface>
</node>"#;

    fn unique_test_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("{name}-{nanos}.xml"))
    }

    #[test]
    fn example_interface_survives_write_and_read() -> Result<()> {
        let interfaces = read_interfaces(EXAMPLE_A)?;
        assert_eq!(interfaces.len(), 1);
        let a = &interfaces[0];
        assert_eq!(a.name(), "org.example.A");
        assert_eq!(a.properties().len(), 1);
        assert_eq!(a.properties()[0].name, "propA1");
        assert!(a.properties()[0].can_read && !a.properties()[0].can_write);
        assert_eq!(a.methods().len(), 1);
        assert_eq!(a.methods()[0].name, "methodA1");

        let written = write_interfaces(&interfaces)?;
        assert_eq!(read_interfaces(&written)?, interfaces);
        Ok(())
    }

    #[test]
    fn capabilities_and_descriptions_round_trip() -> Result<()> {
        let interface = Interface::builder("org.example.Thermostat")
            .description("Heating & cooling <control>")
            .property(
                Property::new("org.example.Thermostat", "target", TypeDescriptor::Number)
                    .readable()
                    .writable()
                    .notifying()
                    .with_description("Target temperature"),
            )
            .property(
                Property::new("org.example.Thermostat", "pin", TypeDescriptor::String).writable(),
            )
            .property(Property::signal(
                "org.example.Thermostat",
                "alarm",
                TypeDescriptor::dictionary(TypeDescriptor::integer(0, 1 << 32)),
            ))
            .method(
                Method::new("org.example.Thermostat", "schedule")
                    .with_description("Schedules a change")
                    .parameter(
                        Parameter::input("at", TypeDescriptor::integer(0, 1 << 64))
                            .with_description("Unix time"),
                    )
                    .parameter(Parameter::output("accepted", TypeDescriptor::Boolean)),
            )
            .build()?;

        let written = write_interfaces(std::slice::from_ref(&interface))?;
        assert!(written.contains("access=\"write\""));
        assert!(written.contains("Heating &amp; cooling &lt;control&gt;"));

        let read = read_interfaces(&written)?;
        assert_eq!(read, vec![interface]);
        Ok(())
    }

    #[test]
    fn descriptions_are_written_trimmed() -> Result<()> {
        let interface = Interface::builder("A")
            .description("  Padded interface\n")
            .property(
                Property::new("A", "p", TypeDescriptor::String)
                    .readable()
                    .with_description("\tPadded property  "),
            )
            .method(
                Method::new("A", "m")
                    .with_description("   ")
                    .parameter(Parameter::input("x", TypeDescriptor::Boolean).with_description(" x ")),
            )
            .build()?;

        let written = write_interfaces(std::slice::from_ref(&interface))?;
        assert!(written.contains("<description>Padded interface</description>"));
        assert!(!written.contains("<description></description>"));

        let read = read_interfaces(&written)?;
        let a = &read[0];
        assert_eq!(a.description(), Some("Padded interface"));
        assert_eq!(a.properties()[0].description.as_deref(), Some("Padded property"));
        assert_eq!(a.methods()[0].description, None);
        assert_eq!(a.methods()[0].parameters[0].description.as_deref(), Some("x"));

        // A second cycle is stable.
        assert_eq!(read_interfaces(&write_interfaces(&read)?)?, read);
        Ok(())
    }

    #[test]
    fn unsupported_types_name_the_member() {
        let interface = Interface::builder("A")
            .property(
                Property::new("A", "p", TypeDescriptor::titled("Point", TypeDescriptor::String))
                    .readable(),
            )
            .build()
            .unwrap();

        let err = write_interfaces(&[interface]).unwrap_err();
        match err {
            DocumentError::Codec {
                element, name, source,
            } => {
                assert_eq!(element, "property");
                assert_eq!(name, "p");
                assert!(matches!(source, CodecError::UnsupportedType(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_round_trip() -> Result<()> {
        let path = unique_test_path("t2t-alljoyn-writer");
        let interfaces = read_interfaces(EXAMPLE_A)?;

        write_interfaces_to_file(&interfaces, &path).await?;
        let read = read_interfaces_from_file(&path).await?;
        assert_eq!(read, interfaces);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let path = unique_test_path("t2t-alljoyn-missing");
        let err = read_interfaces_from_file(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::Io { path: ref p, .. } if *p == path));
    }
}
