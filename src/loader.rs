// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `glshaders`.
//
// `glshaders` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `glshaders` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `glshaders`. If not, see <https://www.gnu.org/licenses/>.

//! Building linked programs from shader sources in one call.

use crate::context::Context;
use crate::driver::{Driver, ShaderKind};
use crate::program::Program;
use crate::shader::Shader;
use crate::Error;

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compile and link a program from vertex and fragment shader sources.
///
/// Every source is compiled into its own shader object. If any of them fail, the logs of
/// every failing shader are returned together. If linking fails, the program's log is
/// returned. The program owns the shaders.
pub fn from_sources<D, V, F>(
    context: &Context<D>,
    vertex: V,
    fragment: F,
) -> Result<Program<D>, Error>
where
    D: Driver,
    V: IntoIterator,
    V::Item: AsRef<str>,
    F: IntoIterator,
    F::Item: AsRef<str>,
{
    let stages = vertex
        .into_iter()
        .map(|src| (ShaderKind::Vertex, src.as_ref().to_string()))
        .chain(
            fragment
                .into_iter()
                .map(|src| (ShaderKind::Fragment, src.as_ref().to_string())),
        )
        .collect::<Vec<_>>();

    let mut shaders = Vec::with_capacity(stages.len());
    let mut log = String::new();
    let mut failed = false;

    for (kind, src) in stages {
        let shader = context.create_shader(kind)?;
        shader.set_source(&src);

        if !shader.compile() {
            failed = true;
            log.push_str(&shader.log());
        }

        shaders.push(shader);
    }

    if failed {
        return Err(Error::Compilation { log });
    }

    let program = context.create_program()?;
    program.attach(&shaders.iter().collect::<Vec<&Shader<D>>>());

    if !program.link() {
        return Err(Error::Compilation { log: program.log() });
    }

    Ok(program)
}

/// Compile and link a program from readers of shader sources.
///
/// The readers are read to the end but not closed.
pub fn from_readers<D, V, F>(
    context: &Context<D>,
    vertex: V,
    fragment: F,
) -> Result<Program<D>, Error>
where
    D: Driver,
    V: IntoIterator,
    V::Item: Read,
    F: IntoIterator,
    F::Item: Read,
{
    let vertex = vertex
        .into_iter()
        .map(read_source)
        .collect::<Result<Vec<_>, _>>()?;
    let fragment = fragment
        .into_iter()
        .map(read_source)
        .collect::<Result<Vec<_>, _>>()?;

    from_sources(context, vertex, fragment)
}

/// Compile and link a program from shader source files.
pub fn from_paths<D, V, F>(
    context: &Context<D>,
    vertex: V,
    fragment: F,
) -> Result<Program<D>, Error>
where
    D: Driver,
    V: IntoIterator,
    V::Item: AsRef<Path>,
    F: IntoIterator,
    F::Item: AsRef<Path>,
{
    let vertex = vertex
        .into_iter()
        .map(File::open)
        .collect::<Result<Vec<_>, _>>()?;
    let fragment = fragment
        .into_iter()
        .map(File::open)
        .collect::<Result<Vec<_>, _>>()?;

    from_readers(context, vertex, fragment)
}

fn read_source(mut reader: impl Read) -> Result<String, Error> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    Ok(source)
}
