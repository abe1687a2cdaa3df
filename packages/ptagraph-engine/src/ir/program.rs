//! Program: the immutable analysis input
//!
//! Owns the type store, class hierarchy, method bodies and entry points.
//! There is deliberately no ambient singleton; the solver receives a
//! `&Program` at construction and everything threads through it.
//!
//! [`ProgramBuilder`] is the hand-off point for IR front ends (and the test
//! fixture API): it interns types, wires the hierarchy, and freezes into a
//! [`Program`].

use rustc_hash::FxHashMap;

use crate::shared::{Indexer, MapIndexer};

use super::classes::{
    names, ClassData, ClassId, FieldData, FieldId, MethodData, MethodId, SubsigId, Subsignature,
    VarData, VarId,
};
use super::stmt::{AllocKind, CallSiteId, Invoke, InvokeKind, Literal, MethodRef, SiteId, Stmt};
use super::types::{TypeId, TypeKind, TypeStore};

#[derive(Debug)]
pub struct Program {
    pub types: TypeStore,
    classes: Vec<ClassData>,
    class_by_name: FxHashMap<String, ClassId>,
    fields: Vec<FieldData>,
    methods: Vec<MethodData>,
    subsigs: MapIndexer<Subsignature>,
    vars: Vec<VarData>,
    /// Allocation site id -> (method, statement index).
    alloc_sites: Vec<(MethodId, u32)>,
    /// Call site id -> (method, statement index).
    call_sites: Vec<(MethodId, u32)>,
    entry_points: Vec<MethodId>,
    object_class: ClassId,
}

impl Program {
    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id as usize]
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassData)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (i as ClassId, c))
    }

    pub fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id as usize]
    }

    pub fn methods_len(&self) -> usize {
        self.methods.len()
    }

    pub fn var(&self, id: VarId) -> &VarData {
        &self.vars[id as usize]
    }

    pub fn vars_len(&self) -> usize {
        self.vars.len()
    }

    pub fn subsig(&self, id: SubsigId) -> &Subsignature {
        self.subsigs.object_of(id)
    }

    pub fn subsig_id(&self, subsig: &Subsignature) -> Option<SubsigId> {
        self.subsigs.index_of(subsig)
    }

    pub fn entry_points(&self) -> &[MethodId] {
        &self.entry_points
    }

    pub fn object_class(&self) -> ClassId {
        self.object_class
    }

    pub fn alloc_site(&self, site: SiteId) -> (MethodId, u32) {
        self.alloc_sites[site as usize]
    }

    pub fn call_site(&self, site: CallSiteId) -> (MethodId, u32) {
        self.call_sites[site as usize]
    }

    /// The invoke statement at a call site.
    pub fn invoke_at(&self, site: CallSiteId) -> &Invoke {
        let (method, idx) = self.call_site(site);
        match self.method(method).body.as_ref().and_then(|b| b.get(idx as usize)) {
            Some(Stmt::Invoke(invoke)) => invoke,
            _ => panic!("call site {site} does not refer to an invoke"),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Hierarchy queries
    // ────────────────────────────────────────────────────────────────────

    /// Reflexive-transitive subclass check, including interfaces.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup {
            return true;
        }
        let data = self.class(sub);
        if let Some(s) = data.superclass {
            if self.is_subclass_of(s, sup) {
                return true;
            }
        }
        data.interfaces.iter().any(|&i| self.is_subclass_of(i, sup))
    }

    /// Can a value of type `source` be stored into a slot of type `target`?
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        match (self.types.kind(target), self.types.kind(source)) {
            (_, TypeKind::Null) => self.types.is_reference(target),
            (TypeKind::Class(t), TypeKind::Class(s)) => self.is_subclass_of(s, t),
            // Arrays are subtypes of Object; element types are covariant.
            (TypeKind::Class(t), TypeKind::Array { .. }) => t == self.object_class,
            (TypeKind::Array { elem: te }, TypeKind::Array { elem: se }) => {
                if self.types.is_reference(te) && self.types.is_reference(se) {
                    self.is_assignable(te, se)
                } else {
                    te == se
                }
            }
            _ => false,
        }
    }

    /// Virtual dispatch: find the implementation of `subsig` for a receiver
    /// of class `class`, walking up the superclass chain.
    pub fn dispatch(&self, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
        let mut current = Some(class);
        while let Some(c) = current {
            let data = self.class(c);
            if let Some(m) = data.declared_method(subsig) {
                if !self.method(m).is_abstract {
                    return Some(m);
                }
            }
            current = data.superclass;
        }
        None
    }

    /// Resolve a method reference from its declared owner.
    pub fn resolve_ref(&self, method_ref: MethodRef) -> Option<MethodId> {
        self.dispatch(method_ref.owner, method_ref.subsig)
    }

    /// Find a field by name on `class` or an ancestor.
    pub fn resolve_field(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let mut current = Some(class);
        while let Some(c) = current {
            let data = self.class(c);
            for &f in &data.fields {
                if self.field(f).name == name {
                    return Some(f);
                }
            }
            current = data.superclass;
        }
        None
    }

    // ────────────────────────────────────────────────────────────────────
    // Textual forms
    // ────────────────────────────────────────────────────────────────────

    pub fn subsig_string(&self, id: SubsigId) -> String {
        let subsig = self.subsig(id);
        let params = subsig
            .params
            .iter()
            .map(|&p| self.types.name(p))
            .collect::<Vec<_>>()
            .join(",");
        format!("{} {}({})", self.types.name(subsig.ret), subsig.name, params)
    }

    /// `<Class: ret name(params)>`
    pub fn method_signature(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!(
            "<{}: {}>",
            self.class(method.class).name,
            self.subsig_string(method.subsig)
        )
    }

    /// `<Class: type name>`
    pub fn field_signature(&self, id: FieldId) -> String {
        let field = self.field(id);
        format!(
            "<{}: {} {}>",
            self.class(field.class).name,
            self.types.name(field.ty),
            field.name
        )
    }

    pub fn call_site_string(&self, site: CallSiteId) -> String {
        let (method, idx) = self.call_site(site);
        format!("{}@{}", self.method_signature(method), idx)
    }

    pub fn alloc_site_string(&self, site: SiteId) -> String {
        let (method, idx) = self.alloc_site(site);
        format!("{}@{}", self.method_signature(method), idx)
    }
}

/// Mutable staging area that freezes into a [`Program`].
#[derive(Debug)]
pub struct ProgramBuilder {
    types: TypeStore,
    classes: Vec<ClassData>,
    class_by_name: FxHashMap<String, ClassId>,
    fields: Vec<FieldData>,
    methods: Vec<MethodData>,
    subsigs: MapIndexer<Subsignature>,
    vars: Vec<VarData>,
    alloc_sites: Vec<(MethodId, u32)>,
    call_sites: Vec<(MethodId, u32)>,
    entry_points: Vec<MethodId>,
    object_class: ClassId,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// A fresh builder pre-seeded with the well-known library classes the
    /// constant heap needs (`Object`, `String`, `Class`, `MethodType`,
    /// `reflect.Method`).
    pub fn new() -> Self {
        let mut builder = Self {
            types: TypeStore::new(),
            classes: Vec::new(),
            class_by_name: FxHashMap::default(),
            fields: Vec::new(),
            methods: Vec::new(),
            subsigs: MapIndexer::new(),
            vars: Vec::new(),
            alloc_sites: Vec::new(),
            call_sites: Vec::new(),
            entry_points: Vec::new(),
            object_class: 0,
        };
        let object = builder.insert_class(names::OBJECT, None, false, false);
        builder.object_class = object;
        builder.insert_class(names::STRING, Some(object), false, false);
        builder.insert_class(names::CLASS, Some(object), false, false);
        builder.insert_class(names::METHOD_TYPE, Some(object), false, false);
        builder.insert_class(names::REFLECT_METHOD, Some(object), false, false);
        builder
    }

    fn insert_class(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
        is_interface: bool,
        is_application: bool,
    ) -> ClassId {
        if let Some(&id) = self.class_by_name.get(name) {
            return id;
        }
        let id = self.classes.len() as ClassId;
        let ty = self.types.intern(name, TypeKind::Class(id));
        self.classes.push(ClassData {
            name: name.to_string(),
            ty,
            superclass,
            interfaces: Vec::new(),
            is_interface,
            is_application,
            fields: Vec::new(),
            methods: Vec::new(),
            clinit: None,
        });
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    /// Add an application or library class; the superclass defaults to
    /// `java.lang.Object`.
    pub fn add_class(&mut self, name: &str, superclass: Option<ClassId>, app: bool) -> ClassId {
        let sup = superclass.unwrap_or(self.object_class);
        self.insert_class(name, Some(sup), false, app)
    }

    pub fn add_interface(&mut self, name: &str, app: bool) -> ClassId {
        self.insert_class(name, Some(self.object_class), true, app)
    }

    pub fn implement(&mut self, class: ClassId, interface: ClassId) {
        let interfaces = &mut self.classes[class as usize].interfaces;
        if !interfaces.contains(&interface) {
            interfaces.push(interface);
        }
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn class_type(&self, class: ClassId) -> TypeId {
        self.classes[class as usize].ty
    }

    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.types.by_name(name)
    }

    pub fn primitive(&mut self, name: &str) -> TypeId {
        self.types.intern(name, TypeKind::Primitive)
    }

    pub fn array_of(&mut self, elem: TypeId) -> TypeId {
        self.types.array_of(elem)
    }

    pub fn null_type(&mut self) -> TypeId {
        self.types.intern("null-type", TypeKind::Null)
    }

    pub fn add_field(&mut self, class: ClassId, name: &str, ty: TypeId, is_static: bool) -> FieldId {
        let id = self.fields.len() as FieldId;
        self.fields.push(FieldData {
            class,
            name: name.to_string(),
            ty,
            is_static,
        });
        self.classes[class as usize].fields.push(id);
        id
    }

    /// Find a field by name on `class` or an ancestor (mirrors
    /// [`Program::resolve_field`], usable during construction).
    pub fn resolve_field(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let mut current = Some(class);
        while let Some(c) = current {
            let data = &self.classes[c as usize];
            for &f in &data.fields {
                if self.fields[f as usize].name == name {
                    return Some(f);
                }
            }
            current = data.superclass;
        }
        None
    }

    pub fn subsig(&mut self, name: &str, params: &[TypeId], ret: TypeId) -> SubsigId {
        self.subsigs.get_index(&Subsignature {
            name: name.to_string(),
            params: params.to_vec(),
            ret,
        })
    }

    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
        is_static: bool,
    ) -> MethodId {
        let subsig = self.subsig(name, params, ret);
        let id = self.methods.len() as MethodId;
        self.methods.push(MethodData {
            class,
            subsig,
            is_static,
            is_abstract: false,
            params: Vec::new(),
            this_var: None,
            ret_vars: Vec::new(),
            body: None,
        });
        self.classes[class as usize].methods.push((subsig, id));
        if name == names::CLINIT {
            self.classes[class as usize].clinit = Some(id);
        }
        id
    }

    pub fn add_abstract_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
    ) -> MethodId {
        let id = self.add_method(class, name, params, ret, false);
        self.methods[id as usize].is_abstract = true;
        id
    }

    pub fn add_entry_point(&mut self, method: MethodId) {
        if !self.entry_points.contains(&method) {
            self.entry_points.push(method);
        }
    }

    /// Register the designated class's static `main` method as the entry
    /// point (the default entry specification).
    pub fn add_main_entry(&mut self, class: ClassId) -> Option<MethodId> {
        let main = self.classes[class as usize]
            .methods
            .iter()
            .map(|&(_, m)| m)
            .find(|&m| {
                let data = &self.methods[m as usize];
                data.is_static && self.subsigs.object_of(data.subsig).name == "main"
            })?;
        self.add_entry_point(main);
        Some(main)
    }

    pub fn method_ref(
        &mut self,
        owner: ClassId,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
    ) -> MethodRef {
        MethodRef {
            owner,
            subsig: self.subsig(name, params, ret),
        }
    }

    fn add_var(&mut self, method: MethodId, name: &str, ty: TypeId) -> VarId {
        let id = self.vars.len() as VarId;
        self.vars.push(VarData {
            method,
            name: name.to_string(),
            ty,
        });
        id
    }

    /// Start building the body of `method`. For instance methods a `%this`
    /// variable is created on first use.
    pub fn body(&mut self, method: MethodId) -> BodyBuilder<'_> {
        BodyBuilder {
            builder: self,
            method,
            stmts: Vec::new(),
        }
    }

    pub fn build(self) -> Program {
        Program {
            types: self.types,
            classes: self.classes,
            class_by_name: self.class_by_name,
            fields: self.fields,
            methods: self.methods,
            subsigs: self.subsigs,
            vars: self.vars,
            alloc_sites: self.alloc_sites,
            call_sites: self.call_sites,
            entry_points: self.entry_points,
            object_class: self.object_class,
        }
    }
}

/// Statement-level builder for one method body.
pub struct BodyBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    method: MethodId,
    stmts: Vec<Stmt>,
}

impl BodyBuilder<'_> {
    pub fn var(&mut self, name: &str, ty: TypeId) -> VarId {
        self.builder.add_var(self.method, name, ty)
    }

    /// Declare the next parameter variable, in order.
    pub fn param(&mut self, name: &str, ty: TypeId) -> VarId {
        let var = self.var(name, ty);
        self.builder.methods[self.method as usize].params.push(var);
        var
    }

    /// The receiver variable (`%this`); created on first use.
    pub fn this(&mut self) -> VarId {
        if let Some(var) = self.builder.methods[self.method as usize].this_var {
            return var;
        }
        let class = self.builder.methods[self.method as usize].class;
        let ty = self.builder.class_type(class);
        let var = self.var("%this", ty);
        self.builder.methods[self.method as usize].this_var = Some(var);
        var
    }

    fn next_alloc_site(&mut self) -> SiteId {
        let site = self.builder.alloc_sites.len() as SiteId;
        self.builder
            .alloc_sites
            .push((self.method, self.stmts.len() as u32));
        site
    }

    fn next_call_site(&mut self) -> CallSiteId {
        let site = self.builder.call_sites.len() as CallSiteId;
        self.builder
            .call_sites
            .push((self.method, self.stmts.len() as u32));
        site
    }

    pub fn new_object(&mut self, lhs: VarId, ty: TypeId) -> SiteId {
        let site = self.next_alloc_site();
        self.stmts.push(Stmt::New {
            lhs,
            alloc: AllocKind::Object { ty },
            site,
        });
        site
    }

    /// `lhs = new elem[l1][l2]...`; one length per dimension, `None` when
    /// not a compile-time constant.
    pub fn new_array(&mut self, lhs: VarId, elem: TypeId, lengths: &[Option<u64>]) -> SiteId {
        let mut ty = elem;
        for _ in 0..lengths.len() {
            ty = self.builder.array_of(ty);
        }
        let site = self.next_alloc_site();
        self.stmts.push(Stmt::New {
            lhs,
            alloc: AllocKind::Array {
                ty,
                lengths: lengths.to_vec(),
            },
            site,
        });
        site
    }

    pub fn assign_str(&mut self, lhs: VarId, value: &str) {
        self.stmts.push(Stmt::AssignLiteral {
            lhs,
            literal: Literal::Str(value.to_string()),
        });
    }

    pub fn assign_class(&mut self, lhs: VarId, ty: TypeId) {
        self.stmts.push(Stmt::AssignLiteral {
            lhs,
            literal: Literal::Class(ty),
        });
    }

    pub fn copy(&mut self, lhs: VarId, rhs: VarId) {
        self.stmts.push(Stmt::Copy { lhs, rhs });
    }

    pub fn cast(&mut self, lhs: VarId, rhs: VarId, ty: TypeId) {
        self.stmts.push(Stmt::Cast { lhs, rhs, ty });
    }

    pub fn load_static(&mut self, lhs: VarId, field: FieldId) {
        self.stmts.push(Stmt::LoadStatic { lhs, field });
    }

    pub fn store_static(&mut self, field: FieldId, rhs: VarId) {
        self.stmts.push(Stmt::StoreStatic { field, rhs });
    }

    pub fn load_field(&mut self, lhs: VarId, base: VarId, field: FieldId) {
        self.stmts.push(Stmt::LoadField { lhs, base, field });
    }

    pub fn store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) {
        self.stmts.push(Stmt::StoreField { base, field, rhs });
    }

    pub fn load_array(&mut self, lhs: VarId, base: VarId) {
        self.stmts.push(Stmt::LoadArray { lhs, base });
    }

    pub fn store_array(&mut self, base: VarId, rhs: VarId) {
        self.stmts.push(Stmt::StoreArray { base, rhs });
    }

    pub fn invoke_static(
        &mut self,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> CallSiteId {
        self.push_invoke(InvokeKind::Static, method_ref, None, args, result, None)
    }

    pub fn invoke_virtual(
        &mut self,
        recv: VarId,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> CallSiteId {
        self.push_invoke(InvokeKind::Virtual, method_ref, Some(recv), args, result, None)
    }

    pub fn invoke_interface(
        &mut self,
        recv: VarId,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> CallSiteId {
        self.push_invoke(
            InvokeKind::Interface,
            method_ref,
            Some(recv),
            args,
            result,
            None,
        )
    }

    pub fn invoke_special(
        &mut self,
        recv: VarId,
        method_ref: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> CallSiteId {
        self.push_invoke(
            InvokeKind::Special,
            method_ref,
            Some(recv),
            args,
            result,
            None,
        )
    }

    /// `invokedynamic` with a bootstrap target handle; the descriptor ref
    /// names the synthetic call, the handle the method it bootstraps to.
    pub fn invoke_dynamic(
        &mut self,
        method_ref: MethodRef,
        handle: MethodRef,
        args: &[VarId],
        result: Option<VarId>,
    ) -> CallSiteId {
        self.push_invoke(
            InvokeKind::Dynamic,
            method_ref,
            None,
            args,
            result,
            Some(handle),
        )
    }

    fn push_invoke(
        &mut self,
        kind: InvokeKind,
        method_ref: MethodRef,
        recv: Option<VarId>,
        args: &[VarId],
        result: Option<VarId>,
        handle: Option<MethodRef>,
    ) -> CallSiteId {
        let site = self.next_call_site();
        self.stmts.push(Stmt::Invoke(Invoke {
            kind,
            method_ref,
            recv,
            args: args.to_vec(),
            result,
            site,
            handle,
        }));
        site
    }

    pub fn ret(&mut self, value: Option<VarId>) {
        if let Some(var) = value {
            let ret_vars = &mut self.builder.methods[self.method as usize].ret_vars;
            if !ret_vars.contains(&var) {
                ret_vars.push(var);
            }
        }
        self.stmts.push(Stmt::Return { value });
    }

    pub fn finish(self) {
        self.builder.methods[self.method as usize].body = Some(self.stmts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_program() -> Program {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A", None, true);
        let sub = b.add_class("B", Some(a), true);
        let a_ty = b.class_type(a);
        let void = b.primitive("void");
        let m = b.add_method(sub, "main", &[], void, true);
        let mut body = b.body(m);
        let x = body.var("x", a_ty);
        body.new_object(x, a_ty);
        body.ret(None);
        body.finish();
        b.add_entry_point(m);
        b.build()
    }

    #[test]
    fn test_subclass_and_assignable() {
        let program = tiny_program();
        let a = program.class_by_name("A").unwrap();
        let sub = program.class_by_name("B").unwrap();
        assert!(program.is_subclass_of(sub, a));
        assert!(!program.is_subclass_of(a, sub));

        let a_ty = program.class(a).ty;
        let b_ty = program.class(sub).ty;
        assert!(program.is_assignable(a_ty, b_ty));
        assert!(!program.is_assignable(b_ty, a_ty));
    }

    #[test]
    fn test_object_supertype_of_arrays() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A", None, true);
        let arr = b.array_of(b.class_type(a));
        let program = b.build();
        let object_ty = program.class(program.object_class()).ty;
        assert!(program.is_assignable(object_ty, arr));
        assert!(!program.is_assignable(arr, object_ty));
    }

    #[test]
    fn test_signatures() {
        let program = tiny_program();
        let main = program.entry_points()[0];
        assert_eq!(program.method_signature(main), "<B: void main()>");
    }

    #[test]
    fn test_add_main_entry_finds_static_main() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("App", None, true);
        let void = b.primitive("void");
        let string_ty = b.type_by_name(names::STRING).unwrap();
        let args_ty = b.array_of(string_ty);
        let main = b.add_method(c, "main", &[args_ty], void, true);
        assert_eq!(b.add_main_entry(c), Some(main));
        let program = b.build();
        assert_eq!(program.entry_points(), &[main]);
    }

    #[test]
    fn test_dispatch_walks_superclass_chain() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A", None, true);
        let sub = b.add_class("B", Some(a), true);
        let void = b.primitive("void");
        let m = b.add_method(a, "run", &[], void, false);
        let program = b.build();
        let subsig = program.method(m).subsig;
        assert_eq!(program.dispatch(sub, subsig), Some(m));
    }
}
