//! Textual LLVM IR emission.
//!
//! The generator never fails: anything it can't resolve (an unknown
//! variable, an unknown function, an unsupported implicit coercion) is
//! emitted as a best-effort default rather than propagated as an error.
//! Diagnostics for such cases belong to the parser stage, not here.

use std::collections::HashMap;
use std::fs;

use vlpc_par::{Block, Expr, Parameter, Stmt};
use vlpc_util::ErrorCollector;

use crate::registry::FunctionInfo;
use crate::scope::{ScopeStack, VariableInfo};
use crate::types::{alignment_for, map_type};

struct ImportedModule {
    alias: String,
    nodes: Vec<Stmt>,
}

pub struct CodeGenerator {
    temp_counter: u32,
    str_counter: u32,
    label_counter: u32,
    globals: String,
    body: String,
    functions: HashMap<String, FunctionInfo>,
    scopes: ScopeStack,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            temp_counter: 0,
            str_counter: 0,
            label_counter: 0,
            globals: String::new(),
            body: String::new(),
            functions: HashMap::new(),
            scopes: ScopeStack::default(),
        }
    }

    fn next_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("%t{}", self.temp_counter)
    }

    fn next_string_name(&mut self) -> String {
        self.str_counter += 1;
        format!(".str{}", self.str_counter)
    }

    fn next_label(&mut self, base: &str) -> String {
        self.label_counter += 1;
        format!("{base}_{}", self.label_counter)
    }

    fn register_function(&mut self, name: &str, return_type: &str, parameters: &[Parameter], ns: &str) {
        let key = if ns.is_empty() { name.to_string() } else { format!("{ns}.{name}") };
        let ir_name = if ns.is_empty() { name.to_string() } else { format!("{ns}_{name}") };
        self.functions.insert(
            key,
            FunctionInfo {
                ir_name,
                return_type: map_type(return_type).to_string(),
                parameters: parameters.to_vec(),
            },
        );
    }

    fn emit_builtins(&self, out: &mut String) {
        out.push_str("; ModuleID = 'vlpc_module'\n");
        out.push_str("target datalayout = \"e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128\"\n");
        out.push_str("target triple = \"x86_64-pc-linux-gnu\"\n\n");
        out.push_str("declare i32 @printf(i8*, ...)\n");
        out.push_str("declare i32 @scanf(i8*, ...)\n");
        out.push_str("declare double @sqrt(double)\n");
        out.push_str("declare i64 @time(i8*)\n\n");
        out.push_str("@.str_int = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\", align 1\n");
        out.push_str("@.str_float = private unnamed_addr constant [4 x i8] c\"%g\\0A\\00\", align 1\n");
        out.push_str("@.str_string = private unnamed_addr constant [4 x i8] c\"%s\\0A\\00\", align 1\n");
        out.push_str("@.str_input_int = private unnamed_addr constant [3 x i8] c\"%d\\00\", align 1\n");
        out.push_str("@.str_input_float = private unnamed_addr constant [4 x i8] c\"%lf\\00\", align 1\n");
        out.push_str("@rand_seed = global i32 1, align 4\n");
        out.push_str("@rand_seeded = global i1 false, align 1\n\n");
    }

    /// Lowers a full program (already-parsed top-level statements) into a
    /// textual LLVM IR module. Resets all per-compilation counters and
    /// registries first, so a `CodeGenerator` can be reused across calls.
    pub fn generate(&mut self, statements: &[Stmt]) -> String {
        self.temp_counter = 0;
        self.str_counter = 0;
        self.label_counter = 0;
        self.functions.clear();
        self.scopes = ScopeStack::default();
        self.globals.clear();

        let mut modules = Vec::new();
        for stmt in statements {
            if let Stmt::ModuleImport { path, alias } = stmt {
                let Ok(content) = fs::read_to_string(path) else {
                    continue;
                };
                let mut local_errors = ErrorCollector::new(&content, path.clone());
                let nodes = vlpc_par::parse(&content, path, &mut local_errors);
                if local_errors.has_errors() {
                    local_errors.print_errors();
                }
                modules.push(ImportedModule { alias: alias.clone(), nodes });
            }
        }

        for module in &modules {
            for stmt in &module.nodes {
                if let Stmt::FunctionDef { name, return_type, parameters, .. } = stmt {
                    self.register_function(name, return_type, parameters, &module.alias);
                }
            }
        }
        for stmt in statements {
            if let Stmt::FunctionDef { name, return_type, parameters, .. } = stmt {
                self.register_function(name, return_type, parameters, "");
            }
        }

        let mut header = String::new();
        self.emit_builtins(&mut header);

        let mut function_blocks = Vec::new();
        for module in &modules {
            for stmt in &module.nodes {
                if let Stmt::FunctionDef { name, return_type, parameters, body } = stmt {
                    let key = if module.alias.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", module.alias, name)
                    };
                    let ir_name = self
                        .functions
                        .get(&key)
                        .map(|f| f.ir_name.clone())
                        .unwrap_or_else(|| name.clone());
                    function_blocks.push(self.emit_function(return_type, parameters, body, &ir_name));
                }
            }
        }
        for stmt in statements {
            if let Stmt::FunctionDef { name, return_type, parameters, body } = stmt {
                let ir_name = self
                    .functions
                    .get(name.as_str())
                    .map(|f| f.ir_name.clone())
                    .unwrap_or_else(|| name.clone());
                function_blocks.push(self.emit_function(return_type, parameters, body, &ir_name));
            }
        }

        let mut ir = String::new();
        ir.push_str(&header);
        if !self.globals.is_empty() {
            ir.push_str(&self.globals);
        }
        for block in &function_blocks {
            ir.push_str(block);
            ir.push('\n');
        }
        if !self.functions.contains_key("main") {
            ir.push_str("define i32 @main() {\n  ret i32 0\n}\n");
        }
        ir
    }

    fn emit_function(&mut self, return_type: &str, parameters: &[Parameter], body: &Block, ir_name: &str) -> String {
        self.scopes.push();
        self.body.clear();

        let ret_type = map_type(return_type);
        let mut out = format!("define {ret_type} @{ir_name}(");
        for (i, param) in parameters.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("{} %{}", map_type(&param.ty), param.name));
        }
        out.push_str(") {\nentry:\n");

        for param in parameters {
            let llvm_type = map_type(&param.ty);
            let slot = self.next_temp();
            let align = alignment_for(llvm_type);
            self.body.push_str(&format!("  {slot} = alloca {llvm_type}, align {align}\n"));
            self.body
                .push_str(&format!("  store {llvm_type} %{}, {llvm_type}* {slot}, align {align}\n", param.name));
            self.scopes.bind(param.name.clone(), VariableInfo { address: slot, ty: llvm_type.to_string() });
        }

        let mut returned = false;
        for stmt in body {
            returned = self.emit_statement(stmt, ret_type);
            if returned {
                break;
            }
        }

        if !returned {
            match ret_type {
                "void" => self.body.push_str("  ret void\n"),
                "i32" => self.body.push_str("  ret i32 0\n"),
                "double" => self.body.push_str("  ret double 0.0\n"),
                "i1" => self.body.push_str("  ret i1 false\n"),
                "i8*" => self.body.push_str("  ret i8* null\n"),
                _ => {}
            }
        }

        out.push_str(&self.body);
        out.push_str("}\n");
        self.scopes.pop();
        out
    }

    /// Emits a nested block in its own scope; returns whether control
    /// left it via an explicit `return`.
    fn emit_block(&mut self, block: &Block, current_return: &str) -> bool {
        self.scopes.push();
        let mut returned = false;
        for stmt in block {
            if self.emit_statement(stmt, current_return) {
                returned = true;
                break;
            }
        }
        self.scopes.pop();
        returned
    }

    fn emit_statement(&mut self, stmt: &Stmt, current_return: &str) -> bool {
        match stmt {
            Stmt::Block(block) => self.emit_block(block, current_return),

            Stmt::VarDecl { name, ty, is_const: _, initializer } => {
                let mut init_type = if ty.is_empty() { String::new() } else { map_type(ty).to_string() };
                let value = if let Some(init_expr) = initializer {
                    let (v, expr_type) = self.emit_expression(init_expr);
                    if init_type.is_empty() {
                        init_type = expr_type;
                        v
                    } else if expr_type != init_type {
                        self.convert(&v, &expr_type, &init_type)
                    } else {
                        v
                    }
                } else {
                    if init_type.is_empty() {
                        init_type = "i32".to_string();
                    }
                    match init_type.as_str() {
                        "double" => "0.0".to_string(),
                        "i1" => "false".to_string(),
                        _ => "0".to_string(),
                    }
                };
                let slot = self.next_temp();
                let align = alignment_for(&init_type);
                self.body.push_str(&format!("  {slot} = alloca {init_type}, align {align}\n"));
                self.body.push_str(&format!("  store {init_type} {value}, {init_type}* {slot}, align {align}\n"));
                self.scopes.bind(name.clone(), VariableInfo { address: slot, ty: init_type });
                false
            }

            Stmt::ExprStmt(expr) => {
                self.emit_expression(expr);
                false
            }

            Stmt::Return(expr_opt) => {
                if let Some(expr) = expr_opt {
                    let (mut value, mut ty) = self.emit_expression(expr);
                    if ty != current_return && current_return != "void" {
                        value = self.convert(&value, &ty, current_return);
                        ty = current_return.to_string();
                    }
                    self.body.push_str(&format!("  ret {ty} {value}\n"));
                } else {
                    self.body.push_str("  ret void\n");
                }
                true
            }

            Stmt::Print { format, args, formatted: _ } => {
                self.emit_print(format, args);
                false
            }

            Stmt::Gather { names } => {
                self.emit_gather(names);
                false
            }

            Stmt::If { condition, then_branch, else_branch } => {
                let (mut cond_val, cond_type) = self.emit_expression(condition);
                if cond_type != "i1" {
                    cond_val = self.convert(&cond_val, &cond_type, "i1");
                }
                let then_label = self.next_label("if_then");
                let else_label = self.next_label("if_else");
                let end_label = self.next_label("if_end");
                let branch_target = if else_branch.is_some() { &else_label } else { &end_label };
                self.body.push_str(&format!("  br i1 {cond_val}, label %{then_label}, label %{branch_target}\n"));
                self.body.push_str(&format!("{then_label}:\n"));
                self.emit_block(then_branch, current_return);
                self.body.push_str(&format!("  br label %{end_label}\n"));
                if let Some(else_block) = else_branch {
                    self.body.push_str(&format!("{else_label}:\n"));
                    self.emit_block(else_block, current_return);
                    self.body.push_str(&format!("  br label %{end_label}\n"));
                }
                self.body.push_str(&format!("{end_label}:\n"));
                false
            }

            Stmt::While { condition, body } => {
                let cond_label = self.next_label("while_cond");
                let body_label = self.next_label("while_body");
                let end_label = self.next_label("while_end");
                self.body.push_str(&format!("  br label %{cond_label}\n"));
                self.body.push_str(&format!("{cond_label}:\n"));
                let (mut cond_val, cond_type) = self.emit_expression(condition);
                if cond_type != "i1" {
                    cond_val = self.convert(&cond_val, &cond_type, "i1");
                }
                self.body.push_str(&format!("  br i1 {cond_val}, label %{body_label}, label %{end_label}\n"));
                self.body.push_str(&format!("{body_label}:\n"));
                self.emit_block(body, current_return);
                self.body.push_str(&format!("  br label %{cond_label}\n"));
                self.body.push_str(&format!("{end_label}:\n"));
                false
            }

            Stmt::For { iterator, start, end, body } => {
                let (start_val, start_type) = self.emit_expression(start);
                let (end_val, end_type) = self.emit_expression(end);
                let start_val = self.convert(&start_val, &start_type, "i32");
                let end_val = self.convert(&end_val, &end_type, "i32");

                let iter_slot = self.next_temp();
                self.body.push_str(&format!("  {iter_slot} = alloca i32, align 4\n"));
                self.body.push_str(&format!("  store i32 {start_val}, i32* {iter_slot}, align 4\n"));
                // Bound in the enclosing scope, not the body's own scope:
                // the loop body may rebind the same name in a nested block
                // without clobbering the iterator itself.
                self.scopes.bind(iterator.clone(), VariableInfo { address: iter_slot.clone(), ty: "i32".to_string() });

                let cond_label = self.next_label("for_cond");
                let loop_label = self.next_label("for_body");
                let end_label = self.next_label("for_end");

                self.body.push_str(&format!("  br label %{cond_label}\n"));
                self.body.push_str(&format!("{cond_label}:\n"));
                let cur = self.next_temp();
                self.body.push_str(&format!("  {cur} = load i32, i32* {iter_slot}, align 4\n"));
                let cmp = self.next_temp();
                self.body.push_str(&format!("  {cmp} = icmp slt i32 {cur}, {end_val}\n"));
                self.body.push_str(&format!("  br i1 {cmp}, label %{loop_label}, label %{end_label}\n"));
                self.body.push_str(&format!("{loop_label}:\n"));
                self.emit_block(body, current_return);
                let next_val = self.next_temp();
                self.body.push_str(&format!("  {next_val} = add i32 {cur}, 1\n"));
                self.body.push_str(&format!("  store i32 {next_val}, i32* {iter_slot}, align 4\n"));
                self.body.push_str(&format!("  br label %{cond_label}\n"));
                self.body.push_str(&format!("{end_label}:\n"));
                false
            }

            // Nested `fx`/`mod` declarations inside a block are parsed but
            // never lowered, same as the reference generator.
            Stmt::FunctionDef { .. } | Stmt::ModuleImport { .. } => false,
        }
    }

    fn emit_print(&mut self, format: &str, args: &[Expr]) {
        let mut arg_vals = Vec::with_capacity(args.len());
        for arg in args {
            arg_vals.push(self.emit_expression(arg));
        }

        let mut built = format.to_string();
        if built.is_empty() && !arg_vals.is_empty() {
            built = "{}".to_string();
        }

        let mut final_fmt = String::new();
        let mut arg_index = 0usize;
        let chars: Vec<char> = built.chars().collect();
        let mut i = 0usize;
        while i < chars.len() {
            if chars[i] == '{' && i + 1 < chars.len() && chars[i + 1] == '}' && arg_index < arg_vals.len() {
                final_fmt.push_str(specifier_for(&arg_vals[arg_index].1));
                arg_index += 1;
                i += 2;
            } else {
                final_fmt.push(chars[i]);
                i += 1;
            }
        }
        while arg_index < arg_vals.len() {
            if !final_fmt.is_empty() && !final_fmt.ends_with(' ') {
                final_fmt.push(' ');
            }
            final_fmt.push_str(specifier_for(&arg_vals[arg_index].1));
            arg_index += 1;
        }
        if !final_fmt.ends_with('\n') {
            final_fmt.push('\n');
        }

        let escaped = escape_string(&final_fmt);
        let length = final_fmt.len();
        let global_name = format!("@{}", self.next_string_name());
        self.globals.push_str(&format!(
            "{global_name} = private unnamed_addr constant [{} x i8] c\"{escaped}\", align 1\n",
            length + 1
        ));

        let fmt_ptr = self.next_temp();
        self.body.push_str(&format!(
            "  {fmt_ptr} = getelementptr inbounds [{0} x i8], [{0} x i8]* {global_name}, i32 0, i32 0\n",
            length + 1
        ));

        let mut converted_args = Vec::with_capacity(arg_vals.len());
        for (val, ty) in arg_vals {
            if ty == "i1" {
                let promoted = self.convert(&val, "i1", "i32");
                converted_args.push((promoted, "i32".to_string()));
            } else {
                converted_args.push((val, ty));
            }
        }

        let call_tmp = self.next_temp();
        let mut call_line = format!("  {call_tmp} = call i32 (i8*, ...) @printf(i8* {fmt_ptr}");
        for (val, ty) in &converted_args {
            call_line.push_str(&format!(", {ty} {val}"));
        }
        call_line.push_str(")\n");
        self.body.push_str(&call_line);
    }

    fn emit_gather(&mut self, names: &[String]) {
        for name in names {
            let address = match self.scopes.resolve(name).cloned() {
                Some(info) => info.address,
                None => {
                    let slot = self.next_temp();
                    self.body.push_str(&format!("  {slot} = alloca i32, align 4\n"));
                    self.body.push_str(&format!("  store i32 0, i32* {slot}, align 4\n"));
                    self.scopes.bind(name.clone(), VariableInfo { address: slot.clone(), ty: "i32".to_string() });
                    slot
                }
            };
            let call = self.next_temp();
            self.body.push_str(&format!(
                "  {call} = call i32 (i8*, ...) @scanf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str_input_int, i32 0, i32 0), i32* {address})\n"
            ));
        }
    }

    fn emit_expression(&mut self, expr: &Expr) -> (String, String) {
        match expr {
            Expr::Number(n) => (n.to_string(), "i32".to_string()),
            Expr::Float(f) => (format!("{f}"), "double".to_string()),

            Expr::StringLit(s) => {
                let global_name = format!("@{}", self.next_string_name());
                let escaped = escape_string(s);
                let length = s.len() + 1;
                self.globals.push_str(&format!(
                    "{global_name} = private unnamed_addr constant [{length} x i8] c\"{escaped}\", align 1\n"
                ));
                let ptr = self.next_temp();
                self.body.push_str(&format!(
                    "  {ptr} = getelementptr inbounds [{length} x i8], [{length} x i8]* {global_name}, i32 0, i32 0\n"
                ));
                (ptr, "i8*".to_string())
            }

            Expr::Bool(b) => (if *b { "true" } else { "false" }.to_string(), "i1".to_string()),

            Expr::Variable(name) => match self.scopes.resolve(name).cloned() {
                None => ("0".to_string(), "i32".to_string()),
                Some(info) => {
                    let tmp = self.next_temp();
                    let align = alignment_for(&info.ty);
                    self.body
                        .push_str(&format!("  {tmp} = load {0}, {0}* {1}, align {align}\n", info.ty, info.address));
                    (tmp, info.ty)
                }
            },

            Expr::Unary { op, operand } => {
                let (val, ty) = self.emit_expression(operand);
                if op == "-" {
                    let tmp = self.next_temp();
                    if ty == "double" {
                        self.body.push_str(&format!("  {tmp} = fsub double 0.0, {val}\n"));
                        (tmp, "double".to_string())
                    } else {
                        let val = if ty != "i32" { self.convert(&val, &ty, "i32") } else { val };
                        self.body.push_str(&format!("  {tmp} = sub i32 0, {val}\n"));
                        (tmp, "i32".to_string())
                    }
                } else {
                    (val, ty)
                }
            }

            Expr::Binary { left, op, right } => self.emit_binary(left, op, right),

            Expr::Assignment { name, value } => match self.scopes.resolve(name).cloned() {
                None => ("0".to_string(), "i32".to_string()),
                Some(target) => {
                    let (rhs, rhs_type) = self.emit_expression(value);
                    let rhs = if rhs_type != target.ty { self.convert(&rhs, &rhs_type, &target.ty) } else { rhs };
                    let align = alignment_for(&target.ty);
                    self.body.push_str(&format!(
                        "  store {0} {rhs}, {0}* {1}, align {align}\n",
                        target.ty, target.address
                    ));
                    (rhs, target.ty)
                }
            },

            Expr::Call { name, args, ns } => self.emit_call(name, args, ns),
        }
    }

    fn emit_binary(&mut self, left: &Expr, op: &str, right: &Expr) -> (String, String) {
        let (l, lt) = self.emit_expression(left);
        let (r, rt) = self.emit_expression(right);

        if matches!(op, "==" | "!=" | "<" | ">" | "<=" | ">=") {
            let cmp_type = if lt == "double" || rt == "double" { "double" } else { "i32" };
            let l = if lt != cmp_type { self.convert(&l, &lt, cmp_type) } else { l };
            let r = if rt != cmp_type { self.convert(&r, &rt, cmp_type) } else { r };
            let tmp = self.next_temp();
            let op_name = if cmp_type == "double" {
                match op {
                    "==" => "fcmp oeq",
                    "!=" => "fcmp one",
                    "<" => "fcmp olt",
                    ">" => "fcmp ogt",
                    "<=" => "fcmp ole",
                    _ => "fcmp oge",
                }
            } else {
                match op {
                    "==" => "icmp eq",
                    "!=" => "icmp ne",
                    "<" => "icmp slt",
                    ">" => "icmp sgt",
                    "<=" => "icmp sle",
                    _ => "icmp sge",
                }
            };
            self.body.push_str(&format!("  {tmp} = {op_name} {cmp_type} {l}, {r}\n"));
            return (tmp, "i1".to_string());
        }

        let res_type = if lt == "double" || rt == "double" { "double" } else { "i32" };
        let l = if lt != res_type { self.convert(&l, &lt, res_type) } else { l };
        let r = if rt != res_type { self.convert(&r, &rt, res_type) } else { r };
        let tmp = self.next_temp();
        let op_name = if res_type == "double" {
            match op {
                "+" => "fadd",
                "-" => "fsub",
                "*" => "fmul",
                _ => "fdiv",
            }
        } else {
            match op {
                "+" => "add",
                "-" => "sub",
                "*" => "mul",
                _ => "sdiv",
            }
        };
        self.body.push_str(&format!("  {tmp} = {op_name} {res_type} {l}, {r}\n"));
        (tmp, res_type.to_string())
    }

    fn emit_call(&mut self, name: &str, args: &[Expr], ns: &str) -> (String, String) {
        if name == "sqrt" && args.len() == 1 {
            let (v, t) = self.emit_expression(&args[0]);
            let v = if t != "double" { self.convert(&v, &t, "double") } else { v };
            let tmp = self.next_temp();
            self.body.push_str(&format!("  {tmp} = call double @sqrt(double {v})\n"));
            return (tmp, "double".to_string());
        }

        if name == "rand" && args.len() == 2 {
            return self.emit_rand_call(&args[0], &args[1]);
        }

        let key = if ns.is_empty() { name.to_string() } else { format!("{ns}.{name}") };
        let Some(info) = self.functions.get(&key).cloned() else {
            return ("0".to_string(), "i32".to_string());
        };

        let mut arg_values = Vec::with_capacity(args.len());
        let mut arg_types = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let (mut v, mut t) = self.emit_expression(arg);
            if let Some(param) = info.parameters.get(i) {
                let expected = map_type(&param.ty);
                if t != expected {
                    v = self.convert(&v, &t, expected);
                }
                t = expected.to_string();
            }
            arg_values.push(v);
            arg_types.push(t);
        }

        let mut res = String::new();
        if info.return_type != "void" {
            res = self.next_temp();
            self.body.push_str(&format!("  {res} = call {} @{}(", info.return_type, info.ir_name));
        } else {
            self.body.push_str(&format!("  call void @{}(", info.ir_name));
        }
        for (i, (v, t)) in arg_values.iter().zip(arg_types.iter()).enumerate() {
            if i > 0 {
                self.body.push_str(", ");
            }
            self.body.push_str(&format!("{t} {v}"));
        }
        self.body.push_str(")\n");
        (res, info.return_type)
    }

    /// A linear congruential generator seeded once per module from
    /// `time(NULL)`. Not thread-safe — the seed is a plain module global,
    /// matching the reference runtime.
    fn emit_rand_call(&mut self, lo_expr: &Expr, hi_expr: &Expr) -> (String, String) {
        let (minv, tmin) = self.emit_expression(lo_expr);
        let (maxv, tmax) = self.emit_expression(hi_expr);
        let minv = self.convert(&minv, &tmin, "i32");
        let maxv = self.convert(&maxv, &tmax, "i32");

        let seeded = self.next_temp();
        let seed_label = self.next_label("seed");
        let cont_label = self.next_label("cont");
        self.body.push_str(&format!("  {seeded} = load i1, i1* @rand_seeded, align 1\n"));
        self.body.push_str(&format!("  br i1 {seeded}, label %{cont_label}, label %{seed_label}\n"));
        self.body.push_str(&format!("{seed_label}:\n"));
        let time_reg = self.next_temp();
        let trunc_reg = self.next_temp();
        self.body.push_str(&format!("  {time_reg} = call i64 @time(i8* null)\n"));
        self.body.push_str(&format!("  {trunc_reg} = trunc i64 {time_reg} to i32\n"));
        self.body.push_str(&format!("  store i32 {trunc_reg}, i32* @rand_seed, align 4\n"));
        self.body.push_str("  store i1 true, i1* @rand_seeded, align 1\n");
        self.body.push_str(&format!("  br label %{cont_label}\n"));
        self.body.push_str(&format!("{cont_label}:\n"));
        let seed = self.next_temp();
        self.body.push_str(&format!("  {seed} = load i32, i32* @rand_seed, align 4\n"));
        let s1 = self.next_temp();
        let s2 = self.next_temp();
        let s3 = self.next_temp();
        self.body.push_str(&format!("  {s1} = mul i32 {seed}, 1103515245\n"));
        self.body.push_str(&format!("  {s2} = add i32 {s1}, 12345\n"));
        self.body.push_str(&format!("  {s3} = and i32 {s2}, 2147483647\n"));
        self.body.push_str(&format!("  store i32 {s3}, i32* @rand_seed, align 4\n"));
        let range = self.next_temp();
        let size = self.next_temp();
        let scaled = self.next_temp();
        let result = self.next_temp();
        self.body.push_str(&format!("  {range} = sub i32 {maxv}, {minv}\n"));
        self.body.push_str(&format!("  {size} = add i32 {range}, 1\n"));
        self.body.push_str(&format!("  {scaled} = urem i32 {s3}, {size}\n"));
        self.body.push_str(&format!("  {result} = add i32 {minv}, {scaled}\n"));
        (result, "i32".to_string())
    }

    fn convert(&mut self, value: &str, from: &str, to: &str) -> String {
        if from == to {
            return value.to_string();
        }
        let tmp = self.next_temp();
        match (from, to) {
            ("i32", "double") => {
                self.body.push_str(&format!("  {tmp} = sitofp i32 {value} to double\n"));
                tmp
            }
            ("double", "i32") => {
                self.body.push_str(&format!("  {tmp} = fptosi double {value} to i32\n"));
                tmp
            }
            ("i32", "i1") => {
                self.body.push_str(&format!("  {tmp} = icmp ne i32 {value}, 0\n"));
                tmp
            }
            ("double", "i1") => {
                self.body.push_str(&format!("  {tmp} = fcmp one double {value}, 0.0\n"));
                tmp
            }
            ("i1", "i32") => {
                self.body.push_str(&format!("  {tmp} = zext i1 {value} to i32\n"));
                tmp
            }
            ("i1", "double") => {
                let mid = self.next_temp();
                self.body.push_str(&format!("  {mid} = zext i1 {value} to i32\n"));
                self.body.push_str(&format!("  {tmp} = sitofp i32 {mid} to double\n"));
                tmp
            }
            // Unknown coercion: the value is passed through unconverted,
            // same as the reference generator.
            _ => value.to_string(),
        }
    }
}

fn specifier_for(ty: &str) -> &'static str {
    match ty {
        "i32" => "%d",
        "double" => "%g",
        "i8*" => "%s",
        _ => "%d",
    }
}

fn escape_string(value: &str) -> String {
    let mut out = String::new();
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\0A"),
            '\t' => out.push_str("\\09"),
            '\r' => out.push_str("\\0D"),
            '\\' => out.push_str("\\5C"),
            '"' => out.push_str("\\22"),
            other => out.push(other),
        }
    }
    out.push_str("\\00");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlpc_util::ErrorCollector;

    fn generate(source: &str) -> String {
        let mut errors = ErrorCollector::new(source, "test.vlp");
        let program = vlpc_par::parse(source, "test.vlp", &mut errors);
        assert!(!errors.has_errors(), "unexpected parse errors: {:?}", errors.diagnostics());
        let mut gen = CodeGenerator::new();
        gen.generate(&program)
    }

    #[test]
    fn emits_module_header_and_default_main() {
        let ir = generate("");
        assert!(ir.contains("target triple = \"x86_64-pc-linux-gnu\""));
        assert!(ir.contains("define i32 @main() {\n  ret i32 0\n}\n"));
    }

    #[test]
    fn user_defined_main_suppresses_default_one() {
        let ir = generate("fx main() -> int { return 0; }");
        assert_eq!(ir.matches("@main(").count(), 1);
    }

    #[test]
    fn namespaced_function_gets_underscore_ir_name() {
        // Without a real module file to import, this only checks that a
        // bare top-level function keeps its name unqualified.
        let ir = generate("fx add(int: a, int: b) -> int { return a + b; }");
        assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
    }

    #[test]
    fn print_with_int_arg_uses_percent_d() {
        let ir = generate(r#"fx main() { print("n = {}", 5); }"#);
        assert!(ir.contains("%n = {}\\0A\\00") || ir.contains("n = %d"));
    }

    #[test]
    fn unknown_function_call_yields_zero() {
        let ir = generate("fx main() { var x = missing(); }");
        assert!(ir.contains("alloca i32"));
    }

    #[test]
    fn escape_string_handles_special_characters() {
        assert_eq!(escape_string("a\nb"), "a\\0Ab\\00");
        assert_eq!(escape_string("\"quoted\""), "\\22quoted\\22\\00");
    }
}
