use indexmap::IndexMap;

use crate::classfile::node::{
    AnnotationNode, Annotations, ClassNode, ConstantValue, ElementValue, FieldNode,
    LocalVariableAnnotationNode, LocalVariableNode, MethodNode, ModuleNode, RecordComponentNode,
    TypeAnnotationNode,
};
use crate::classfile::version::ClassVersion;
use crate::snapshot::model::*;

/// Build the structural snapshot of one decoded class.
///
/// Total over any successfully decoded tree. Nothing is sorted or
/// normalised: map order is the order of appearance in the class file, and
/// an attribute absent from the binary stays `None`.
pub fn build_class_snapshot(node: &ClassNode) -> ClassSnapshot {
    let annotations = AnnotationMaps::from(&node.annotations);

    ClassSnapshot {
        access: node.access,
        name: node.name.clone(),
        super_name: node.super_name.clone(),
        interfaces: node.interfaces.clone(),
        signature: node.signature.clone(),
        source_file: node.source_file.clone(),
        source_debug: node.source_debug.clone(),
        version: ClassVersion::from_word(node.version),
        fields: node
            .fields
            .iter()
            .map(|f| (f.name.clone(), field_snapshot(f)))
            .collect(),
        methods: node
            .methods
            .iter()
            .map(|m| (format!("{}{}", m.name, m.descriptor), method_snapshot(m)))
            .collect(),
        inner_classes: node
            .inner_classes
            .iter()
            .map(|ic| {
                (
                    ic.name.clone(),
                    InnerClassSnapshot {
                        name: ic.name.clone(),
                        outer_name: ic.outer_name.clone(),
                        inner_name: ic.inner_name.clone(),
                        access: ic.access,
                    },
                )
            })
            .collect(),
        module: node.module.as_ref().map(module_snapshot),
        nest_host: node.nest_host.clone(),
        nest_members: node.nest_members.clone(),
        outer_class: node.outer_class.clone(),
        outer_method: node.outer_method.clone(),
        outer_method_desc: node.outer_method_desc.clone(),
        permitted_subclasses: node.permitted_subclasses.clone(),
        record_components: node.record_components.as_ref().map(|components| {
            components
                .iter()
                .map(|rc| (format!("{}{}", rc.name, rc.descriptor), record_component_snapshot(rc)))
                .collect()
        }),
        visible_annotations: annotations.visible,
        invisible_annotations: annotations.invisible,
        visible_type_annotations: annotations.visible_type,
        invisible_type_annotations: annotations.invisible_type,
        attrs: attrs(&node.attrs),
    }
}

fn field_snapshot(node: &FieldNode) -> FieldSnapshot {
    let annotations = AnnotationMaps::from(&node.annotations);

    FieldSnapshot {
        access: node.access,
        name: node.name.clone(),
        descriptor: node.descriptor.clone(),
        signature: node.signature.clone(),
        value: node.value.as_ref().map(field_value),
        visible_annotations: annotations.visible,
        invisible_annotations: annotations.invisible,
        visible_type_annotations: annotations.visible_type,
        invisible_type_annotations: annotations.invisible_type,
        attrs: attrs(&node.attrs),
    }
}

fn method_snapshot(node: &MethodNode) -> MethodSnapshot {
    let annotations = AnnotationMaps::from(&node.annotations);

    MethodSnapshot {
        access: node.access,
        name: node.name.clone(),
        descriptor: node.descriptor.clone(),
        signature: node.signature.clone(),
        exceptions: node.exceptions.clone(),
        annotation_default: node.annotation_default.as_ref().map(annotation_value),
        attrs: attrs(&node.attrs),
        instructions: node.instructions.clone(),
        visible_annotable_parameter_count: node.visible_annotable_parameter_count,
        invisible_annotable_parameter_count: node.invisible_annotable_parameter_count,
        visible_annotations: annotations.visible,
        invisible_annotations: annotations.invisible,
        visible_parameter_annotations: parameter_annotations(&node.visible_parameter_annotations),
        invisible_parameter_annotations: parameter_annotations(&node.invisible_parameter_annotations),
        visible_type_annotations: annotations.visible_type,
        invisible_type_annotations: annotations.invisible_type,
        local_variables: node.local_variables.as_ref().map(|locals| {
            locals
                .iter()
                .map(|lv| (lv.name.clone(), local_variable_snapshot(lv)))
                .collect()
        }),
        visible_local_variable_annotations: local_variable_annotations(
            &node.visible_local_variable_annotations,
        ),
        invisible_local_variable_annotations: local_variable_annotations(
            &node.invisible_local_variable_annotations,
        ),
    }
}

fn record_component_snapshot(node: &RecordComponentNode) -> RecordComponentSnapshot {
    let annotations = AnnotationMaps::from(&node.annotations);

    RecordComponentSnapshot {
        name: node.name.clone(),
        descriptor: node.descriptor.clone(),
        signature: node.signature.clone(),
        visible_annotations: annotations.visible,
        invisible_annotations: annotations.invisible,
        visible_type_annotations: annotations.visible_type,
        invisible_type_annotations: annotations.invisible_type,
        attrs: attrs(&node.attrs),
    }
}

fn module_snapshot(node: &ModuleNode) -> ModuleSnapshot {
    ModuleSnapshot {
        name: node.name.clone(),
        access: node.access,
        version: node.version.clone(),
        main_class: node.main_class.clone(),
        packages: node.packages.clone(),
        requires: node
            .requires
            .iter()
            .map(|r| ModuleRequireSnapshot {
                module: r.module.clone(),
                access: r.access,
                version: r.version.clone(),
            })
            .collect(),
        exports: node
            .exports
            .iter()
            .map(|e| ModuleExportSnapshot {
                package: e.package.clone(),
                access: e.access,
                modules: e.modules.clone(),
            })
            .collect(),
        opens: node
            .opens
            .iter()
            .map(|o| ModuleOpenSnapshot {
                package: o.package.clone(),
                access: o.access,
                modules: o.modules.clone(),
            })
            .collect(),
        uses: node.uses.clone(),
        provides: node
            .provides
            .iter()
            .map(|p| ModuleProvideSnapshot {
                service: p.service.clone(),
                providers: p.providers.clone(),
            })
            .collect(),
    }
}

fn local_variable_snapshot(node: &LocalVariableNode) -> LocalVariableSnapshot {
    LocalVariableSnapshot {
        name: node.name.clone(),
        descriptor: node.descriptor.clone(),
        signature: node.signature.clone(),
        index: node.index,
        start: LabelReference::at(node.start),
        end: LabelReference::at(node.end),
    }
}

fn local_variable_annotations(
    nodes: &Option<Vec<LocalVariableAnnotationNode>>,
) -> Option<IndexMap<String, LocalVariableAnnotationSnapshot>> {
    nodes.as_ref().map(|nodes| {
        nodes
            .iter()
            .map(|n| {
                (
                    n.type_annotation.annotation.descriptor.clone(),
                    LocalVariableAnnotationSnapshot {
                        type_annotation: type_annotation_snapshot(&n.type_annotation),
                        start: n.start.iter().copied().map(LabelReference::at).collect(),
                        end: n.end.iter().copied().map(LabelReference::at).collect(),
                        index: n.index.clone(),
                    },
                )
            })
            .collect()
    })
}

/// The four annotation maps of one annotatable element.
struct AnnotationMaps {
    visible: Option<AnnotationMap>,
    invisible: Option<AnnotationMap>,
    visible_type: Option<TypeAnnotationMap>,
    invisible_type: Option<TypeAnnotationMap>,
}

impl From<&Annotations> for AnnotationMaps {
    fn from(a: &Annotations) -> Self {
        Self {
            visible: annotation_map(&a.visible),
            invisible: annotation_map(&a.invisible),
            visible_type: type_annotation_map(&a.visible_type),
            invisible_type: type_annotation_map(&a.invisible_type),
        }
    }
}

/// Repeated descriptors keep their first position and last value.
fn annotation_map(nodes: &Option<Vec<AnnotationNode>>) -> Option<AnnotationMap> {
    nodes.as_ref().map(|nodes| {
        nodes
            .iter()
            .map(|n| (n.descriptor.clone(), annotation_snapshot(n)))
            .collect()
    })
}

fn type_annotation_map(nodes: &Option<Vec<TypeAnnotationNode>>) -> Option<TypeAnnotationMap> {
    nodes.as_ref().map(|nodes| {
        nodes
            .iter()
            .map(|n| (n.annotation.descriptor.clone(), type_annotation_snapshot(n)))
            .collect()
    })
}

fn parameter_annotations(
    params: &Option<Vec<Vec<AnnotationNode>>>,
) -> Option<Vec<Vec<AnnotationSnapshot>>> {
    params.as_ref().map(|params| {
        params
            .iter()
            .map(|param| param.iter().map(annotation_snapshot).collect())
            .collect()
    })
}

fn annotation_snapshot(node: &AnnotationNode) -> AnnotationSnapshot {
    AnnotationSnapshot {
        descriptor: node.descriptor.clone(),
        values: node
            .values
            .iter()
            .map(|(name, value)| AnnotationElement {
                name: name.clone(),
                value: annotation_value(value),
            })
            .collect(),
    }
}

fn type_annotation_snapshot(node: &TypeAnnotationNode) -> TypeAnnotationSnapshot {
    TypeAnnotationSnapshot {
        type_ref: node.type_ref,
        type_path: node.type_path.clone(),
        annotation: annotation_snapshot(&node.annotation),
    }
}

fn annotation_value(value: &ElementValue) -> AnnotationValue {
    match value {
        ElementValue::Byte(v) => AnnotationValue::Byte(*v),
        ElementValue::Char(v) => AnnotationValue::Char(*v),
        ElementValue::Short(v) => AnnotationValue::Short(*v),
        ElementValue::Int(v) => AnnotationValue::Int(*v),
        ElementValue::Long(v) => AnnotationValue::Long(*v),
        ElementValue::Float(v) => AnnotationValue::Float(*v),
        ElementValue::Double(v) => AnnotationValue::Double(*v),
        ElementValue::Boolean(v) => AnnotationValue::Boolean(*v),
        ElementValue::String(v) => AnnotationValue::String(v.clone()),
        ElementValue::Enum {
            descriptor,
            constant,
        } => AnnotationValue::Enum {
            descriptor: descriptor.clone(),
            constant: constant.clone(),
        },
        ElementValue::Class(v) => AnnotationValue::Class(v.clone()),
        ElementValue::Annotation(a) => AnnotationValue::Annotation(Box::new(annotation_snapshot(a))),
        ElementValue::Array(values) => {
            AnnotationValue::Array(values.iter().map(annotation_value).collect())
        }
    }
}

fn field_value(value: &ConstantValue) -> FieldValue {
    match value {
        ConstantValue::Int(v) => FieldValue::Int(*v),
        ConstantValue::Long(v) => FieldValue::Long(*v),
        ConstantValue::Float(v) => FieldValue::Float(*v),
        ConstantValue::Double(v) => FieldValue::Double(*v),
        ConstantValue::String(v) => FieldValue::String(v.clone()),
    }
}

fn attrs(names: &Option<Vec<String>>) -> Option<Vec<AttributeSnapshot>> {
    names.as_ref().map(|names| {
        names
            .iter()
            .map(|name| AttributeSnapshot { name: name.clone() })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{DecodeOptions, parse_class};
    use jarverify_testkit::{AnnotationSpec, ClassBuilder, ElementSpec};

    fn snapshot(builder: ClassBuilder) -> ClassSnapshot {
        let node = parse_class(&builder.build(), &DecodeOptions::default()).expect("decodes");
        build_class_snapshot(&node)
    }

    #[test]
    fn methods_are_keyed_by_name_and_descriptor() {
        let class = snapshot(
            ClassBuilder::new("a/Over")
                .method(0x0001, "put", "(I)V")
                .method(0x0001, "put", "(J)V"),
        );

        let keys: Vec<_> = class.methods.keys().cloned().collect();
        assert_eq!(keys, vec!["put(I)V", "put(J)V"]);
        assert_eq!(class.methods["put(J)V"].name, "put");
    }

    #[test]
    fn fields_are_keyed_by_name_in_file_order() {
        let class = snapshot(
            ClassBuilder::new("a/F")
                .field(0x0002, "z", "I")
                .field(0x0002, "a", "J"),
        );

        let keys: Vec<_> = class.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(class.fields["a"].descriptor, "J");
    }

    #[test]
    fn splits_version_word() {
        let class = snapshot(ClassBuilder::new("a/V").version(61, 0));
        assert_eq!(class.version, ClassVersion::new(61, 0));
    }

    #[test]
    fn absent_and_empty_annotations_stay_distinct() {
        let empty = snapshot(ClassBuilder::new("a/B").visible_annotations(vec![]));
        let absent = snapshot(ClassBuilder::new("a/B"));

        assert_eq!(empty.visible_annotations, Some(IndexMap::new()));
        assert_eq!(absent.visible_annotations, None);
        assert_ne!(empty, absent);
    }

    #[test]
    fn annotations_are_keyed_by_descriptor() {
        let class = snapshot(ClassBuilder::new("a/B").visible_annotations(vec![
            AnnotationSpec::new("Lx/First;"),
            AnnotationSpec::new("Lx/Second;").element("v", ElementSpec::Int(1)),
        ]));

        let visible = class.visible_annotations.expect("present");
        let keys: Vec<_> = visible.keys().cloned().collect();
        assert_eq!(keys, vec!["Lx/First;", "Lx/Second;"]);
        assert_eq!(
            visible["Lx/Second;"].values,
            vec![AnnotationElement {
                name: "v".into(),
                value: AnnotationValue::Int(1)
            }]
        );
    }

    #[test]
    fn carries_constant_values_and_unknown_attributes() {
        let class = snapshot(
            ClassBuilder::new("a/C")
                .long_constant_field("ID", 7)
                .raw_attribute("Custom", &[0xFF]),
        );

        assert_eq!(class.fields["ID"].value, Some(FieldValue::Long(7)));
        assert_eq!(
            class.attrs,
            Some(vec![AttributeSnapshot {
                name: "Custom".into()
            }])
        );
    }

    #[test]
    fn building_twice_is_deterministic() {
        let bytes = ClassBuilder::new("a/D")
            .field(0x0001, "x", "I")
            .method(0x0001, "m", "()V")
            .build();
        let a = build_class_snapshot(&parse_class(&bytes, &DecodeOptions::default()).unwrap());
        let b = build_class_snapshot(&parse_class(&bytes, &DecodeOptions::default()).unwrap());

        assert_eq!(a, b);
    }
}
