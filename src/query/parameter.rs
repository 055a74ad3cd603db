use crate::value::Value;

/// A named statement parameter
///
/// `source_column` names the column the value is compared with or assigned
/// to, when there is one, so drivers can pick a matching parameter type.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name:          String,
    pub value:         Value,
    pub source_column: Option<String>,
}

/// Running `@PARAMn` allocator shared by every clause of one statement
#[derive(Debug, Default)]
pub(crate) struct ParameterList {
    parameters: Vec<Parameter>,
}

impl ParameterList {
    pub(crate) fn bind(&mut self, value: Value, source_column: Option<&str>) -> String {
        let name = format!("@PARAM{}", self.parameters.len() + 1);
        self.parameters.push(Parameter {
            name:          name.clone(),
            value:         value.bind(),
            source_column: source_column.map(str::to_string),
        });
        name
    }

    pub(crate) fn into_vec(self) -> Vec<Parameter> {
        self.parameters
    }
}
