// Copyright 2026 The Changeset Engine Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single test binary gluing together the end-to-end scenario files (`spec.md`
//! §8), one file per scenario, the way `lib/tests/runner.rs` glues together
//! the teacher's `test_*.rs` files.

mod common;

mod scenario_a_grouping;
mod scenario_b_shared_metadata;
mod scenario_d_branch_sprout;
mod scenario_f_double_dead;
