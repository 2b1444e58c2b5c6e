//! # 서비스(비즈니스 로직) 모듈
//!
//! - `versioning`: 문서 버전 체인 (추가, 최신 조회, 목록, 문서 삭제)
//! - `content`: 다운로드 파일명과 Content-Type/Content-Disposition 결정
//! - `cascade`: 부서/하위 프로세스/절차의 트랜잭션 연쇄 삭제와 부서장 재지정
//!
//! 서비스는 상태를 갖지 않습니다. 저장소 핸들(`&SqlitePool`)은 매 호출마다 인자로 받습니다.

pub mod cascade;
pub mod content;
pub mod versioning;
