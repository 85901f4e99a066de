//! Path traversal over [`Record`]s.
//!
//! A direct path is a single accessor call on the host. A dotted path folds
//! all but its last segment as nested-record getters, starting from the host,
//! then calls the final accessor on the record reached.
//!
//! Missing accessors are configuration mistakes, so every failure is returned
//! to the caller as-is. `set` never creates missing intermediate records.

use crate::error::ResolutionError;
use crate::path::Path;
use crate::record::Record;
use crate::value::Value;

/// Read the value at `path`, starting from `host`.
pub fn get(host: &dyn Record, path: &Path) -> Result<Value, ResolutionError> {
    let (last, parents) = path.split_last();
    let mut record = host;
    for segment in parents {
        record = record.nested(segment)?;
    }
    record.read(last)
}

/// Write `value` at `path`, starting from `host`.
pub fn set(host: &mut dyn Record, path: &Path, value: Value) -> Result<(), ResolutionError> {
    let (last, parents) = path.split_last();
    let mut record = host;
    for segment in parents {
        record = record.nested_mut(segment)?;
    }
    record.write(last, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Line {
        number: Value,
    }

    impl Record for Line {
        fn read(&self, name: &str) -> Result<Value, ResolutionError> {
            match name {
                "number" => Ok(self.number.clone()),
                _ => Err(ResolutionError::undefined("Line", name)),
            }
        }

        fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
            match name {
                "number" => {
                    self.number = value;
                    Ok(())
                }
                _ => Err(ResolutionError::undefined("Line", name)),
            }
        }

        fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
            Err(ResolutionError::undefined("Line", name))
        }

        fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
            Err(ResolutionError::undefined("Line", name))
        }
    }

    #[derive(Default)]
    struct Office {
        name: Value,
        line: Option<Line>,
    }

    impl Record for Office {
        fn read(&self, name: &str) -> Result<Value, ResolutionError> {
            match name {
                "name" => Ok(self.name.clone()),
                "line" => Err(ResolutionError::not_nested("Office", name)),
                _ => Err(ResolutionError::undefined("Office", name)),
            }
        }

        fn write(&mut self, name: &str, _value: Value) -> Result<(), ResolutionError> {
            match name {
                "name" => Err(ResolutionError::read_only("Office", name)),
                _ => Err(ResolutionError::undefined("Office", name)),
            }
        }

        fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
            match (name, &self.line) {
                ("line", Some(line)) => Ok(line),
                _ => Err(ResolutionError::undefined("Office", name)),
            }
        }

        fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
            match (name, &mut self.line) {
                ("line", Some(line)) => Ok(line),
                _ => Err(ResolutionError::undefined("Office", name)),
            }
        }
    }

    #[derive(Default)]
    struct Company {
        number: Value,
        office: Office,
    }

    impl Record for Company {
        fn read(&self, name: &str) -> Result<Value, ResolutionError> {
            match name {
                "number" => Ok(self.number.clone()),
                _ => Err(ResolutionError::undefined("Company", name)),
            }
        }

        fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
            match name {
                "number" => {
                    self.number = value;
                    Ok(())
                }
                _ => Err(ResolutionError::undefined("Company", name)),
            }
        }

        fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
            match name {
                "office" => Ok(&self.office),
                "number" => Err(ResolutionError::not_nested("Company", name)),
                _ => Err(ResolutionError::undefined("Company", name)),
            }
        }

        fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
            match name {
                "office" => Ok(&mut self.office),
                "number" => Err(ResolutionError::not_nested("Company", name)),
                _ => Err(ResolutionError::undefined("Company", name)),
            }
        }
    }

    fn path(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn test_direct_round_trip() {
        let mut company = Company::default();
        set(&mut company, &path("number"), "00-0000-1111".into()).unwrap();
        assert_eq!(company.number, "00-0000-1111");
        assert_eq!(get(&company, &path("number")).unwrap(), "00-0000-1111");
    }

    #[test]
    fn test_deep_path_writes_through() {
        let mut company = Company::default();
        company.office.line = Some(Line {
            number: "88-9999-0000".into(),
        });

        assert_eq!(get(&company, &path("office.line.number")).unwrap(), "88-9999-0000");

        set(&mut company, &path("office.line.number"), "77-6666-5555".into()).unwrap();
        assert_eq!(company.office.line.as_ref().unwrap().number, "77-6666-5555");
    }

    #[test]
    fn test_missing_intermediate_is_not_created() {
        let mut company = Company::default();
        let err = set(&mut company, &path("office.line.number"), "1".into()).unwrap_err();
        assert_eq!(err, ResolutionError::undefined("Office", "line"));
        assert!(company.office.line.is_none(), "set must not create intermediates");
    }

    #[test]
    fn test_missing_final_accessor() {
        let company = Company::default();
        let err = get(&company, &path("tel_number")).unwrap_err();
        assert_eq!(err, ResolutionError::undefined("Company", "tel_number"));
    }

    #[test]
    fn test_value_used_as_intermediate() {
        let company = Company::default();
        let err = get(&company, &path("number.area")).unwrap_err();
        assert_eq!(err, ResolutionError::not_nested("Company", "number"));
    }

    #[test]
    fn test_read_only_final_accessor() {
        let mut company = Company::default();
        let err = set(&mut company, &path("office.name"), "HQ".into()).unwrap_err();
        assert_eq!(err, ResolutionError::read_only("Office", "name"));
    }
}
