/*
 * Versioned wire contract with the platform API. Payloads are validated
 * here, at the boundary, and converted into the domain models; nothing
 * outside this module touches raw upstream JSON.
*/

pub mod v1;
