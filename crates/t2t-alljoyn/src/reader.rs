//! Reads interfaces from AllJoyn introspection XML.
//!
//! Reference: <https://wiki.allseenalliance.org/irb/extended_introspection_xml>

use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};
use t2t_protocol::{Interface, Method, Parameter, Property, TypeDescriptor};
use tokio::fs;
use tracing::{debug, instrument};

use crate::error::DocumentError;
use crate::signature;

/// Reads interfaces from an introspection XML file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn read_interfaces_from_file(
    path: impl AsRef<Path>,
) -> Result<Vec<Interface>, DocumentError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)
        .await
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    read_interfaces(&xml)
}

/// Reads one or more interfaces from introspection XML contents.
pub fn read_interfaces(xml: &str) -> Result<Vec<Interface>, DocumentError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let document = Document::parse_with_options(xml, options)?;
    let root = document.root_element();
    if !root.has_tag_name("node") {
        return Err(DocumentError::MissingElement("/node"));
    }

    let interfaces = child_elements(root, "interface")
        .map(parse_interface)
        .collect::<Result<Vec<_>, _>>()?;
    if interfaces.is_empty() {
        return Err(DocumentError::MissingElement("/node/interface"));
    }

    debug!(count = interfaces.len(), "interfaces read");
    Ok(interfaces)
}

fn parse_interface(element: Node<'_, '_>) -> Result<Interface, DocumentError> {
    let name = required_attribute(element, "name", "/node/interface")?;

    // Properties come first so a signal sharing a property's name merges
    // into the property's position. Signatures are decoded per element, so
    // an undecodable one is reported against its own element before any
    // merge; only two decoded types that differ are inconsistent.
    let mut properties = child_elements(element, "property")
        .map(|property| parse_property(property, name))
        .collect::<Result<Vec<_>, _>>()?;
    for signal in child_elements(element, "signal") {
        properties.push(parse_signal(signal, name)?);
    }

    let methods = child_elements(element, "method")
        .map(|method| parse_method(method, name))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        interface = name,
        properties = properties.len(),
        methods = methods.len(),
        "interface parsed"
    );
    Ok(Interface::new(
        name,
        description(element),
        properties,
        methods,
        Vec::new(),
    )?)
}

fn parse_property(element: Node<'_, '_>, interface_name: &str) -> Result<Property, DocumentError> {
    const PATH: &str = "/node/interface/property";
    let name = required_attribute(element, "name", PATH)?;
    let access = required_attribute(element, "access", PATH)?;
    let signature = required_attribute(element, "type", PATH)?;

    let (can_read, can_write) = match access {
        "read" => (true, false),
        "write" => (false, true),
        "readwrite" => (true, true),
        other => {
            return Err(DocumentError::InvalidAttribute {
                element: PATH,
                attribute: "access",
                value: other.to_owned(),
            });
        }
    };

    let mut property = Property::new(interface_name, name, decode("property", name, signature)?);
    property.can_read = can_read;
    property.can_write = can_write;
    property.description = description(element);
    Ok(property)
}

fn parse_signal(element: Node<'_, '_>, interface_name: &str) -> Result<Property, DocumentError> {
    const PATH: &str = "/node/interface/signal/arg";
    let name = required_attribute(element, "name", "/node/interface/signal")?;

    let mut payload: Option<TypeDescriptor> = None;
    for arg in child_elements(element, "arg") {
        let signature = required_attribute(arg, "type", PATH)?;
        match required_attribute(arg, "direction", PATH)? {
            "in" => {
                return Err(DocumentError::SignalInputNotSupported {
                    signal: name.to_owned(),
                });
            }
            "out" if payload.is_some() => {
                return Err(DocumentError::MultipleSignalPayloads {
                    signal: name.to_owned(),
                });
            }
            "out" => payload = Some(decode("signal", name, signature)?),
            other => return Err(invalid_direction(PATH, other)),
        }
    }

    let payload = payload.ok_or_else(|| DocumentError::MissingSignalPayload {
        signal: name.to_owned(),
    })?;
    let mut property = Property::signal(interface_name, name, payload);
    property.description = description(element);
    Ok(property)
}

fn parse_method(element: Node<'_, '_>, interface_name: &str) -> Result<Method, DocumentError> {
    const PATH: &str = "/node/interface/method/arg";
    let name = required_attribute(element, "name", "/node/interface/method")?;

    let mut method = Method::new(interface_name, name);
    method.description = description(element);
    for arg in child_elements(element, "arg") {
        let arg_name = required_attribute(arg, "name", PATH)?;
        let signature = required_attribute(arg, "type", PATH)?;
        let parameter_type = decode("argument", arg_name, signature)?;
        let mut parameter = match required_attribute(arg, "direction", PATH)? {
            "in" => Parameter::input(arg_name, parameter_type),
            "out" => Parameter::output(arg_name, parameter_type),
            other => return Err(invalid_direction(PATH, other)),
        };
        parameter.description = description(arg);
        method.parameters.push(parameter);
    }
    Ok(method)
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(tag))
}

fn required_attribute<'a>(
    element: Node<'a, '_>,
    attribute: &'static str,
    path: &'static str,
) -> Result<&'a str, DocumentError> {
    element
        .attribute(attribute)
        .filter(|value| !value.is_empty())
        .ok_or(DocumentError::MissingAttribute {
            element: path,
            attribute,
        })
}

// Descriptions are stored trimmed; blank ones are absent.
fn description(element: Node<'_, '_>) -> Option<String> {
    child_elements(element, "description")
        .next()
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn decode(element: &'static str, name: &str, signature: &str) -> Result<TypeDescriptor, DocumentError> {
    signature::decode(signature).map_err(|source| DocumentError::Codec {
        element,
        name: name.to_owned(),
        source,
    })
}

fn invalid_direction(path: &'static str, value: &str) -> DocumentError {
    DocumentError::InvalidAttribute {
        element: path,
        attribute: "direction",
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use t2t_protocol::{Characteristic, SchemaError};

    use super::*;
    use crate::error::CodecError;

    const LAMP: &str = r#"<?xml version="1.0"?>
<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
  "http://standards.freedesktop.org/dbus/introspect-1.0.dtd">
<node>
  <interface name="org.example.Lamp">
    <description>A dimmable lamp</description>
    <property name="brightness" access="readwrite" type="y">
      <description>Brightness level</description>
    </property>
    <property name="colors" access="read" type="a{s(yyy)}"/>
    <signal name="brightness">
      <arg name="brightness" type="y" direction="out"/>
    </signal>
    <signal name="overheated">
      <description>Raised when the lamp is too hot</description>
      <arg type="d" direction="out"/>
    </signal>
    <method name="blink">
      <arg name="times" type="q" direction="in">
        <description>Number of blinks</description>
      </arg>
      <arg name="completed" type="b" direction="out"/>
    </method>
  </interface>
  <interface name="org.example.Empty"/>
</node>"#;

    #[test]
    fn reads_properties_signals_and_methods() {
        let interfaces = read_interfaces(LAMP).unwrap();
        assert_eq!(interfaces.len(), 2);

        let lamp = &interfaces[0];
        assert_eq!(lamp.name(), "org.example.Lamp");
        assert_eq!(lamp.description(), Some("A dimmable lamp"));
        assert_eq!(lamp.properties().len(), 3);

        let brightness = lamp.property("brightness").unwrap();
        assert!(brightness.can_read && brightness.can_write && brightness.can_notify);
        assert_eq!(brightness.description.as_deref(), Some("Brightness level"));
        assert_eq!(brightness.property_type, TypeDescriptor::integer(0, 256));
        assert_eq!(brightness.interface_name, "org.example.Lamp");

        let overheated = lamp.property("overheated").unwrap();
        assert!(overheated.is_signal());
        assert_eq!(overheated.property_type, TypeDescriptor::Number);

        let blink = lamp.method("blink").unwrap();
        assert_eq!(blink.parameters.len(), 2);
        assert_eq!(blink.parameters[0].description.as_deref(), Some("Number of blinks"));
        assert_eq!(
            blink.return_parameter().map(|p| &p.parameter_type),
            Some(&TypeDescriptor::Boolean)
        );

        assert!(interfaces[1].properties().is_empty());
    }

    #[test]
    fn property_and_signal_with_different_types_conflict() {
        let xml = r#"<node><interface name="A">
            <property name="p" access="read" type="s"/>
            <signal name="p"><arg type="i" direction="out"/></signal>
        </interface></node>"#;
        let err = read_interfaces(xml).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Schema(SchemaError::InconsistentPropertyType { .. })
        ));
    }

    #[test]
    fn signal_requires_exactly_one_out_argument() {
        let missing = r#"<node><interface name="A"><signal name="s"/></interface></node>"#;
        assert!(matches!(
            read_interfaces(missing),
            Err(DocumentError::MissingSignalPayload { .. })
        ));

        let multiple = r#"<node><interface name="A"><signal name="s">
            <arg type="s" direction="out"/><arg type="s" direction="out"/>
        </signal></interface></node>"#;
        assert!(matches!(
            read_interfaces(multiple),
            Err(DocumentError::MultipleSignalPayloads { .. })
        ));

        let input = r#"<node><interface name="A"><signal name="s">
            <arg type="s" direction="in"/>
        </signal></interface></node>"#;
        assert!(matches!(
            read_interfaces(input),
            Err(DocumentError::SignalInputNotSupported { .. })
        ));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(read_interfaces("<node>"), Err(DocumentError::Xml(_))));
        assert!(matches!(
            read_interfaces("<root/>"),
            Err(DocumentError::MissingElement("/node"))
        ));
        assert!(matches!(
            read_interfaces("<node/>"),
            Err(DocumentError::MissingElement("/node/interface"))
        ));
        assert!(matches!(
            read_interfaces(r#"<node><interface/></node>"#),
            Err(DocumentError::MissingAttribute { attribute: "name", .. })
        ));
        assert!(matches!(
            read_interfaces(
                r#"<node><interface name="A"><property name="p" access="sometimes" type="s"/></interface></node>"#
            ),
            Err(DocumentError::InvalidAttribute { attribute: "access", .. })
        ));
        assert!(matches!(
            read_interfaces(
                r#"<node><interface name="A"><property name="p" access="read" type="a{is}"/></interface></node>"#
            ),
            Err(DocumentError::Codec { element: "property", .. })
        ));
    }

    #[test]
    fn runaway_signature_is_a_codec_error() {
        let xml = format!(
            r#"<node><interface name="A"><property name="p" access="read" type="{}s"/></interface></node>"#,
            "a".repeat(20_000)
        );
        assert!(matches!(
            read_interfaces(&xml),
            Err(DocumentError::Codec {
                element: "property",
                source: CodecError::InvalidSignature { .. },
                ..
            })
        ));
    }

    #[test]
    fn undecodable_signal_names_the_signal_even_when_merging() {
        let xml = r#"<node><interface name="A">
            <property name="p" access="read" type="s"/>
            <signal name="p"><arg type="z" direction="out"/></signal>
        </interface></node>"#;
        match read_interfaces(xml).unwrap_err() {
            DocumentError::Codec { element, name, .. } => {
                assert_eq!(element, "signal");
                assert_eq!(name, "p");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn methods_reject_second_out_argument() {
        let xml = r#"<node><interface name="A"><method name="m">
            <arg name="a" type="s" direction="out"/>
            <arg name="b" type="s" direction="out"/>
        </method></interface></node>"#;
        assert!(matches!(
            read_interfaces(xml),
            Err(DocumentError::Schema(SchemaError::MultipleOutParameters { .. }))
        ));
    }
}
