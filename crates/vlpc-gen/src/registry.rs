//! The function registry: maps a source-level lookup key (`ns.name` or
//! bare `name`) to the information needed to call it from IR.

use vlpc_par::Parameter;

#[derive(Clone, Debug)]
pub struct FunctionInfo {
    pub ir_name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}
