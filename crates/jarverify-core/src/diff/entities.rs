//! Attribute-by-attribute comparison for every snapshot entity.
//!
//! Each impl destructures `self` without `..`, so adding a snapshot
//! attribute without comparing it is a compile error.

use crate::diff::engine::{DiffBuilder, Diffable};
use crate::snapshot::model::*;

impl Diffable for ClassSnapshot {
    /// Fields and methods are diffed separately at member granularity and
    /// are not repeated here.
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ClassSnapshot {
            access,
            name,
            super_name,
            interfaces,
            signature,
            source_file,
            source_debug,
            version,
            fields: _,
            methods: _,
            inner_classes,
            module,
            nest_host,
            nest_members,
            outer_class,
            outer_method,
            outer_method_desc,
            permitted_subclasses,
            record_components,
            visible_annotations,
            invisible_annotations,
            visible_type_annotations,
            invisible_type_annotations,
            attrs,
        } = self;

        b.append("access", access, &o.access)
            .append("name", name, &o.name)
            .append("super_name", super_name, &o.super_name)
            .append("interfaces", interfaces, &o.interfaces)
            .append("signature", signature, &o.signature)
            .append("source_file", source_file, &o.source_file)
            .append("source_debug", source_debug, &o.source_debug)
            .append("version", version, &o.version)
            .append_map("inner_classes", inner_classes, &o.inner_classes)
            .append_optional("module", module, &o.module)
            .append("nest_host", nest_host, &o.nest_host)
            .append("nest_members", nest_members, &o.nest_members)
            .append("outer_class", outer_class, &o.outer_class)
            .append("outer_method", outer_method, &o.outer_method)
            .append("outer_method_desc", outer_method_desc, &o.outer_method_desc)
            .append("permitted_subclasses", permitted_subclasses, &o.permitted_subclasses)
            .append_optional_map("record_components", record_components, &o.record_components)
            .append_optional_map("visible_annotations", visible_annotations, &o.visible_annotations)
            .append_optional_map("invisible_annotations", invisible_annotations, &o.invisible_annotations)
            .append_optional_map(
                "visible_type_annotations",
                visible_type_annotations,
                &o.visible_type_annotations,
            )
            .append_optional_map(
                "invisible_type_annotations",
                invisible_type_annotations,
                &o.invisible_type_annotations,
            )
            .append("attrs", attrs, &o.attrs);
    }
}

impl Diffable for FieldSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let FieldSnapshot {
            access,
            name,
            descriptor,
            signature,
            value,
            visible_annotations,
            invisible_annotations,
            visible_type_annotations,
            invisible_type_annotations,
            attrs,
        } = self;

        b.append("access", access, &o.access)
            .append("name", name, &o.name)
            .append("descriptor", descriptor, &o.descriptor)
            .append("signature", signature, &o.signature)
            .append("value", value, &o.value)
            .append_optional_map("visible_annotations", visible_annotations, &o.visible_annotations)
            .append_optional_map("invisible_annotations", invisible_annotations, &o.invisible_annotations)
            .append_optional_map(
                "visible_type_annotations",
                visible_type_annotations,
                &o.visible_type_annotations,
            )
            .append_optional_map(
                "invisible_type_annotations",
                invisible_type_annotations,
                &o.invisible_type_annotations,
            )
            .append("attrs", attrs, &o.attrs);
    }
}

impl Diffable for MethodSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let MethodSnapshot {
            access,
            name,
            descriptor,
            signature,
            exceptions,
            annotation_default,
            attrs,
            instructions,
            visible_annotable_parameter_count,
            invisible_annotable_parameter_count,
            visible_annotations,
            invisible_annotations,
            visible_parameter_annotations,
            invisible_parameter_annotations,
            visible_type_annotations,
            invisible_type_annotations,
            local_variables,
            visible_local_variable_annotations,
            invisible_local_variable_annotations,
        } = self;

        b.append("access", access, &o.access)
            .append("name", name, &o.name)
            .append("descriptor", descriptor, &o.descriptor)
            .append("signature", signature, &o.signature)
            .append("exceptions", exceptions, &o.exceptions)
            .append("annotation_default", annotation_default, &o.annotation_default)
            .append("attrs", attrs, &o.attrs)
            .append("instructions", instructions, &o.instructions)
            .append(
                "visible_annotable_parameter_count",
                visible_annotable_parameter_count,
                &o.visible_annotable_parameter_count,
            )
            .append(
                "invisible_annotable_parameter_count",
                invisible_annotable_parameter_count,
                &o.invisible_annotable_parameter_count,
            )
            .append_optional_map("visible_annotations", visible_annotations, &o.visible_annotations)
            .append_optional_map("invisible_annotations", invisible_annotations, &o.invisible_annotations)
            .append(
                "visible_parameter_annotations",
                visible_parameter_annotations,
                &o.visible_parameter_annotations,
            )
            .append(
                "invisible_parameter_annotations",
                invisible_parameter_annotations,
                &o.invisible_parameter_annotations,
            )
            .append_optional_map(
                "visible_type_annotations",
                visible_type_annotations,
                &o.visible_type_annotations,
            )
            .append_optional_map(
                "invisible_type_annotations",
                invisible_type_annotations,
                &o.invisible_type_annotations,
            )
            .append_optional_map("local_variables", local_variables, &o.local_variables)
            .append_optional_map(
                "visible_local_variable_annotations",
                visible_local_variable_annotations,
                &o.visible_local_variable_annotations,
            )
            .append_optional_map(
                "invisible_local_variable_annotations",
                invisible_local_variable_annotations,
                &o.invisible_local_variable_annotations,
            );
    }
}

impl Diffable for AnnotationSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let AnnotationSnapshot { descriptor, values } = self;

        b.append("descriptor", descriptor, &o.descriptor)
            .append("values", values, &o.values);
    }
}

impl Diffable for TypeAnnotationSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let TypeAnnotationSnapshot {
            type_ref,
            type_path,
            annotation,
        } = self;

        b.append("type_ref", type_ref, &o.type_ref)
            .append("type_path", type_path, &o.type_path);
        annotation.diff_fields(&o.annotation, b);
    }
}

impl Diffable for LocalVariableAnnotationSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let LocalVariableAnnotationSnapshot {
            type_annotation,
            start,
            end,
            index,
        } = self;

        type_annotation.diff_fields(&o.type_annotation, b);
        b.append("start", start, &o.start)
            .append("end", end, &o.end)
            .append("index", index, &o.index);
    }
}

impl Diffable for InnerClassSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let InnerClassSnapshot {
            name,
            outer_name,
            inner_name,
            access,
        } = self;

        b.append("name", name, &o.name)
            .append("outer_name", outer_name, &o.outer_name)
            .append("inner_name", inner_name, &o.inner_name)
            .append("access", access, &o.access);
    }
}

impl Diffable for ModuleSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ModuleSnapshot {
            name,
            access,
            version,
            main_class,
            packages,
            requires,
            exports,
            opens,
            uses,
            provides,
        } = self;

        b.append("name", name, &o.name)
            .append("access", access, &o.access)
            .append("version", version, &o.version)
            .append("main_class", main_class, &o.main_class)
            .append("packages", packages, &o.packages)
            .append("requires", requires, &o.requires)
            .append("exports", exports, &o.exports)
            .append("opens", opens, &o.opens)
            .append("uses", uses, &o.uses)
            .append("provides", provides, &o.provides);
    }
}

impl Diffable for ModuleRequireSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ModuleRequireSnapshot {
            module,
            access,
            version,
        } = self;

        b.append("module", module, &o.module)
            .append("access", access, &o.access)
            .append("version", version, &o.version);
    }
}

impl Diffable for ModuleExportSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ModuleExportSnapshot {
            package,
            access,
            modules,
        } = self;

        b.append("package", package, &o.package)
            .append("access", access, &o.access)
            .append("modules", modules, &o.modules);
    }
}

impl Diffable for ModuleOpenSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ModuleOpenSnapshot {
            package,
            access,
            modules,
        } = self;

        b.append("package", package, &o.package)
            .append("access", access, &o.access)
            .append("modules", modules, &o.modules);
    }
}

impl Diffable for ModuleProvideSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let ModuleProvideSnapshot { service, providers } = self;

        b.append("service", service, &o.service)
            .append("providers", providers, &o.providers);
    }
}

impl Diffable for RecordComponentSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let RecordComponentSnapshot {
            name,
            descriptor,
            signature,
            visible_annotations,
            invisible_annotations,
            visible_type_annotations,
            invisible_type_annotations,
            attrs,
        } = self;

        b.append("name", name, &o.name)
            .append("descriptor", descriptor, &o.descriptor)
            .append("signature", signature, &o.signature)
            .append_optional_map("visible_annotations", visible_annotations, &o.visible_annotations)
            .append_optional_map("invisible_annotations", invisible_annotations, &o.invisible_annotations)
            .append_optional_map(
                "visible_type_annotations",
                visible_type_annotations,
                &o.visible_type_annotations,
            )
            .append_optional_map(
                "invisible_type_annotations",
                invisible_type_annotations,
                &o.invisible_type_annotations,
            )
            .append("attrs", attrs, &o.attrs);
    }
}

impl Diffable for LocalVariableSnapshot {
    fn diff_fields(&self, o: &Self, b: &mut DiffBuilder) {
        let LocalVariableSnapshot {
            name,
            descriptor,
            signature,
            index,
            start,
            end,
        } = self;

        b.append("name", name, &o.name)
            .append("descriptor", descriptor, &o.descriptor)
            .append("signature", signature, &o.signature)
            .append("index", index, &o.index)
            .append("start", start, &o.start)
            .append("end", end, &o.end);
    }
}
